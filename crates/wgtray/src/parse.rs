//! Parsing of `nmcli connection show` output.
//!
//! `nmcli` prints a human-oriented table, so this is line scraping: a line is a
//! connection of interest when it contains a UUID followed by one or more spaces
//! and the requested connection type. Everything else in the listing (ethernet,
//! wifi, loopback, the header) is skipped without complaint.

use regex::Regex;

/// Length of a connection UUID: 32 hex digits and 4 dashes.
pub const UUID_LENGTH: usize = 32 + 4;

/// Prefix of the activation state field in `nmcli connection show <uuid>`.
pub const STATE_PREFIX: &str = "GENERAL.STATE:";

const UUID_PATTERN: &str = "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}";

/// A connection as it appears in one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub name: String,
    pub uuid: String,
}

/// Result of scanning a per-connection status dump for the state field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateLine {
    /// No `GENERAL.STATE:` line at all; nmcli omits it for inactive connections.
    Missing,
    Present { active: bool },
}

/// Extracts every connection of `type_filter` from a listing, in output order.
///
/// `name` is the line's first space-delimited column, so names containing
/// spaces are truncated to their first word.
pub fn parse_connections(output: &str, type_filter: &str) -> Vec<ConnectionRecord> {
    let pattern = format!("{}[ ]+{}", UUID_PATTERN, regex::escape(type_filter));
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            log::error!("Invalid connection pattern '{}': {}", pattern, e);
            return Vec::new();
        }
    };

    output
        .lines()
        .filter_map(|line| {
            let found = re.find(line)?;
            let name = line.find(' ').map(|i| &line[..i]).unwrap_or(line);
            Some(ConnectionRecord {
                name: name.to_string(),
                uuid: found.as_str()[..UUID_LENGTH].to_string(),
            })
        })
        .collect()
}

/// Looks for the `GENERAL.STATE:` field in a status dump.
///
/// The connection counts as active when the value's last word is exactly
/// `activated`; `activating`, `deactivating` and `deactivated` do not.
pub fn parse_state(output: &str) -> StateLine {
    let mut state = StateLine::Missing;
    for line in output.lines() {
        if let Some(value) = line.strip_prefix(STATE_PREFIX) {
            let active = value.split_whitespace().last() == Some("activated");
            state = StateLine::Present { active };
            if active {
                break;
            }
        }
    }
    state
}

/// Returns `true` if `s` is a lowercase 8-4-4-4-12 hex UUID.
pub fn is_uuid(s: &str) -> bool {
    const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

    s.len() == UUID_LENGTH
        && s.split('-').count() == GROUPS.len()
        && s.split('-').zip(GROUPS).all(|(group, len)| {
            group.len() == len && group.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
NAME             UUID                                  TYPE       DEVICE
prod-tunnel      deb63752-d5e7-4b93-a03d-9ec9f5fa7b73  wireguard  prod-tunnel
Wired connection 1  7a1b2c3d-0000-4111-8222-933344445555  ethernet   enp3s0
office-lan       abc12345-aaaa-4bbb-8ccc-ddddeeeeffff  ethernet   --
home             0f0e0d0c-1111-4222-8333-444455556666  wireguard  --
lo               11111111-2222-4333-8444-555566667777  loopback   lo
";

    #[test]
    fn lists_only_matching_type() {
        let records = parse_connections(LISTING, "wireguard");
        assert_eq!(
            records,
            vec![
                ConnectionRecord {
                    name: "prod-tunnel".into(),
                    uuid: "deb63752-d5e7-4b93-a03d-9ec9f5fa7b73".into(),
                },
                ConnectionRecord {
                    name: "home".into(),
                    uuid: "0f0e0d0c-1111-4222-8333-444455556666".into(),
                },
            ]
        );
    }

    #[test]
    fn single_space_separator_matches() {
        let line = "prod-tunnel      deb63752-d5e7-4b93-a03d-9ec9f5fa7b73 wireguard";
        let records = parse_connections(line, "wireguard");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "prod-tunnel");
        assert_eq!(records[0].uuid, "deb63752-d5e7-4b93-a03d-9ec9f5fa7b73");
    }

    #[test]
    fn other_types_and_malformed_ids_are_skipped() {
        let lines = "\
office-lan      abc12345-aaaa-4bbb-8ccc-ddddeeeeffff ethernet
upper      DEB63752-D5E7-4B93-A03D-9EC9F5FA7B73 wireguard
short      deb63752-d5e7-4b93-a03d-9ec9f5fa7b7 wireguard
glued      deb63752-d5e7-4b93-a03d-9ec9f5fa7b73wireguard
";
        assert!(parse_connections(lines, "wireguard").is_empty());
    }

    #[test]
    fn filter_is_case_sensitive_and_literal() {
        let line = "vpn1  deb63752-d5e7-4b93-a03d-9ec9f5fa7b73  WireGuard";
        assert!(parse_connections(line, "wireguard").is_empty());
        assert!(parse_connections(line, "Wire.uard").is_empty());
        assert_eq!(parse_connections(line, "WireGuard").len(), 1);
    }

    #[test]
    fn empty_output_gives_no_records() {
        assert!(parse_connections("", "wireguard").is_empty());
    }

    #[test]
    fn state_activated() {
        let dump = "\
connection.id:                          prod-tunnel
GENERAL.NAME:                           prod-tunnel
GENERAL.STATE:                          activated
";
        assert_eq!(parse_state(dump), StateLine::Present { active: true });
        assert_eq!(
            parse_state("GENERAL.STATE:activated"),
            StateLine::Present { active: true }
        );
    }

    #[test]
    fn state_not_yet_active() {
        assert_eq!(
            parse_state("GENERAL.STATE:                          activating"),
            StateLine::Present { active: false }
        );
        assert_eq!(
            parse_state("GENERAL.STATE:                          deactivated"),
            StateLine::Present { active: false }
        );
    }

    #[test]
    fn state_missing() {
        let dump = "connection.id:  home\nconnection.type:  wireguard\n";
        assert_eq!(parse_state(dump), StateLine::Missing);
        assert_eq!(parse_state(""), StateLine::Missing);
        // Prefix must start the line.
        assert_eq!(parse_state("  GENERAL.STATE: activated"), StateLine::Missing);
    }

    #[test]
    fn uuid_validation() {
        assert!(is_uuid("deb63752-d5e7-4b93-a03d-9ec9f5fa7b73"));
        assert!(!is_uuid("DEB63752-D5E7-4B93-A03D-9EC9F5FA7B73"));
        assert!(!is_uuid("deb63752d5e74b93a03d9ec9f5fa7b73"));
        assert!(!is_uuid("deb63752-d5e7-4b93-a03d9-ec9f5fa7b73"));
        assert!(!is_uuid("prod-tunnel"));
    }
}
