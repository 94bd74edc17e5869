//! Parsing of inbound WhatsApp message commands.

use crate::queue::{Location, Plate};

/// A recognized customer command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Join the queue at a location. `plate` is `None` when the sender
    /// omitted the second token; the handler replies with usage help.
    Register {
        location: Location,
        plate: Option<Plate>,
    },
    /// Ask for the current queue listing at a location.
    List { location: Location },
}

/// Result of parsing a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult {
    /// A valid command was found.
    Command(Command),
    /// The message does not start with a known command keyword.
    Unrecognized,
}

/// Parse a message body into a command.
///
/// Matching is prefix-based and case-insensitive on the trimmed text, so
/// `#DaftarAntrian B1234XYZ` works. The second whitespace-separated token,
/// uppercased, is the plate for admission commands.
pub fn parse_message(text: &str) -> ParseResult {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();

    let second_token = || trimmed.split_whitespace().nth(1).map(Plate::normalize);

    if lower.starts_with("#daftarantrian") {
        ParseResult::Command(Command::Register {
            location: Location::MallNusantara,
            plate: second_token(),
        })
    } else if lower.starts_with("#updateantrian") {
        ParseResult::Command(Command::List {
            location: Location::MallNusantara,
        })
    } else if lower.starts_with("#daftarlist") {
        ParseResult::Command(Command::Register {
            location: Location::StasiunJatinegara,
            plate: second_token(),
        })
    } else if lower.starts_with("#updatelist") {
        ParseResult::Command(Command::List {
            location: Location::StasiunJatinegara,
        })
    } else {
        ParseResult::Unrecognized
    }
}

/// The admission keyword for a location, for usage-help replies.
pub fn register_keyword(location: Location) -> &'static str {
    match location {
        Location::MallNusantara => "#daftarantrian",
        Location::StasiunJatinegara => "#daftarlist",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_mall() {
        let result = parse_message("#daftarantrian b1234xyz");
        assert_eq!(
            result,
            ParseResult::Command(Command::Register {
                location: Location::MallNusantara,
                plate: Some(Plate("B1234XYZ".to_string())),
            })
        );
    }

    #[test]
    fn test_register_station() {
        let result = parse_message("#daftarlist D5678AB");
        assert_eq!(
            result,
            ParseResult::Command(Command::Register {
                location: Location::StasiunJatinegara,
                plate: Some(Plate("D5678AB".to_string())),
            })
        );
    }

    #[test]
    fn test_register_without_plate() {
        let result = parse_message("#daftarantrian");
        assert_eq!(
            result,
            ParseResult::Command(Command::Register {
                location: Location::MallNusantara,
                plate: None,
            })
        );
    }

    #[test]
    fn test_list_commands() {
        assert_eq!(
            parse_message("#updateantrian"),
            ParseResult::Command(Command::List {
                location: Location::MallNusantara,
            })
        );
        assert_eq!(
            parse_message("#updatelist"),
            ParseResult::Command(Command::List {
                location: Location::StasiunJatinegara,
            })
        );
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert_eq!(
            parse_message("#DaftarAntrian B1"),
            ParseResult::Command(Command::Register {
                location: Location::MallNusantara,
                plate: Some(Plate("B1".to_string())),
            })
        );
    }

    #[test]
    fn test_leading_whitespace_is_trimmed() {
        assert_eq!(
            parse_message("  #updatelist"),
            ParseResult::Command(Command::List {
                location: Location::StasiunJatinegara,
            })
        );
    }

    #[test]
    fn test_unknown_text_is_unrecognized() {
        assert_eq!(parse_message("halo, mau daftar dong"), ParseResult::Unrecognized);
        assert_eq!(parse_message(""), ParseResult::Unrecognized);
    }

    #[test]
    fn test_extra_tokens_after_plate_are_ignored() {
        let result = parse_message("#daftarantrian B1 tolong ya");
        assert_eq!(
            result,
            ParseResult::Command(Command::Register {
                location: Location::MallNusantara,
                plate: Some(Plate("B1".to_string())),
            })
        );
    }
}
