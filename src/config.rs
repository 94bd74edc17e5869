use anyhow::{Context, Result};
use std::collections::HashMap;
use std::env;

use crate::queue::Location;

#[derive(Clone)]
pub struct Config {
    /// Shared secret echoed back during webhook verification.
    pub verify_token: String,
    /// Static key gating the admin action surface.
    pub admin_key: String,
    /// WhatsApp Cloud API bearer token.
    pub access_token: String,
    /// WhatsApp Cloud API phone number id (the `from` number).
    pub phone_number_id: String,
    /// Firebase Realtime Database base URL.
    pub database_url: String,
    /// Optional database secret appended as `?auth=` to store requests.
    pub database_auth: Option<String>,
    /// Optional broadcast group per location.
    pub group_id_mall: Option<String>,
    pub group_id_jatinegara: Option<String>,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let verify_token =
            env::var("VERIFY_TOKEN").context("VERIFY_TOKEN environment variable is required")?;

        let admin_key =
            env::var("ADMIN_KEY").context("ADMIN_KEY environment variable is required")?;

        let access_token =
            env::var("ACCESS_TOKEN").context("ACCESS_TOKEN environment variable is required")?;

        let phone_number_id =
            env::var("PHONE_ID").context("PHONE_ID environment variable is required")?;

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_auth = env::var("DATABASE_AUTH")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let group_id_mall = env::var("GROUP_ID_MALL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let group_id_jatinegara = env::var("GROUP_ID_JATINEGARA")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid number")?;

        Ok(Config {
            verify_token,
            admin_key,
            access_token,
            phone_number_id,
            database_url,
            database_auth,
            group_id_mall,
            group_id_jatinegara,
            port,
        })
    }

    /// The configured broadcast groups, keyed by location.
    pub fn group_ids(&self) -> HashMap<Location, String> {
        let mut ids = HashMap::new();
        if let Some(id) = &self.group_id_mall {
            ids.insert(Location::MallNusantara, id.clone());
        }
        if let Some(id) = &self.group_id_jatinegara {
            ids.insert(Location::StasiunJatinegara, id.clone());
        }
        ids
    }
}
