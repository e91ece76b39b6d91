// MIT License - Copyright (c) 2026 Peter Wright
// Payload decoding driven by command classification

use crate::catalog::{Classification, Command};
use crate::constants::{CommandCode, LoginType, PARTITION_ID_WIDTH, ZONE_ID_WIDTH};
use crate::devices::keypad::LedState;
use crate::devices::partition::ArmMode;

/// Structured fields pulled out of a frame's data.
///
/// An empty residual is `None`, so "no payload" is distinguishable from a
/// payload that happens to be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    pub data: Option<String>,
    pub zone: Option<String>,
    pub partition: Option<String>,
}

/// Decode the raw data of a frame according to its command's classification.
pub fn decode(command: &Command, raw: &str) -> Decoded {
    match command.classification {
        Classification::Zone => {
            let (zone, rest) = take_chars(raw, ZONE_ID_WIDTH);
            Decoded {
                data: non_empty(rest),
                zone: non_empty(zone),
                partition: None,
            }
        }
        Classification::Partition => {
            let (partition, rest) = take_chars(raw, PARTITION_ID_WIDTH);
            Decoded {
                data: non_empty(rest),
                zone: None,
                partition: non_empty(partition),
            }
        }
        Classification::PartitionAndZone => {
            let (partition, rest) = take_chars(raw, PARTITION_ID_WIDTH);
            let (zone, rest) = take_chars(rest, ZONE_ID_WIDTH);
            Decoded {
                data: non_empty(rest),
                zone: non_empty(zone),
                partition: non_empty(partition),
            }
        }
        _ => Decoded {
            data: non_empty(raw),
            zone: None,
            partition: None,
        },
    }
}

/// Human-readable description of a decoded payload, if it has one.
pub fn describe_data(command: &Command, data: Option<&str>) -> Option<String> {
    let data = data?;
    let described = match command.classification {
        Classification::LedState => LedState::from_hex(data).map(|leds| leds.describe()),
        Classification::Login => LoginType::from_code(data).map(|t| t.description().to_string()),
        _ if command.is(CommandCode::PartitionArmed) => {
            ArmMode::from_code(data).map(|m| m.description().to_string())
        }
        _ => None,
    };
    Some(described.unwrap_or_else(|| data.to_string()))
}

/// Split off the first `n` characters (fewer if the input is shorter).
fn take_chars(s: &str, n: usize) -> (&str, &str) {
    match s.char_indices().nth(n) {
        Some((idx, _)) => s.split_at(idx),
        None => (s, ""),
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CommandCatalog;

    #[test]
    fn test_zone_data_parse() {
        let catalog = CommandCatalog::new();
        let decoded = decode(&catalog.lookup("609"), "001");
        assert_eq!(
            decoded,
            Decoded {
                data: None,
                zone: Some("001".to_string()),
                partition: None,
            }
        );
    }

    #[test]
    fn test_zone_partition_data_parse() {
        let catalog = CommandCatalog::new();
        let decoded = decode(&catalog.lookup("601"), "1001");
        assert_eq!(decoded.partition.as_deref(), Some("1"));
        assert_eq!(decoded.zone.as_deref(), Some("001"));
        assert_eq!(decoded.data, None);
    }

    #[test]
    fn test_partition_data_parse_with_residual() {
        let catalog = CommandCatalog::new();
        let decoded = decode(&catalog.lookup("652"), "12");
        assert_eq!(decoded.partition.as_deref(), Some("1"));
        assert_eq!(decoded.data.as_deref(), Some("2"));

        // User closing carries the user code after the partition
        let decoded = decode(&catalog.lookup("700"), "10040");
        assert_eq!(decoded.partition.as_deref(), Some("1"));
        assert_eq!(decoded.data.as_deref(), Some("0040"));
    }

    #[test]
    fn test_data_passthrough() {
        let catalog = CommandCatalog::new();
        let decoded = decode(&catalog.lookup("510"), "83");
        assert_eq!(decoded.data.as_deref(), Some("83"));
        assert_eq!(decoded.zone, None);
        assert_eq!(decoded.partition, None);

        let decoded = decode(&catalog.lookup("802"), "");
        assert_eq!(decoded, Decoded::default());
    }

    #[test]
    fn test_short_payloads() {
        let catalog = CommandCatalog::new();
        let decoded = decode(&catalog.lookup("601"), "1");
        assert_eq!(decoded.partition.as_deref(), Some("1"));
        assert_eq!(decoded.zone, None);

        let decoded = decode(&catalog.lookup("609"), "");
        assert_eq!(decoded, Decoded::default());
    }

    #[test]
    fn test_describe_data() {
        let catalog = CommandCatalog::new();
        assert_eq!(
            describe_data(&catalog.lookup("510"), Some("83")).as_deref(),
            Some("Backlight, Armed, Ready")
        );
        assert_eq!(
            describe_data(&catalog.lookup("505"), Some("1")).as_deref(),
            Some("Login Successful")
        );
        assert_eq!(
            describe_data(&catalog.lookup("652"), Some("1")).as_deref(),
            Some("Stay")
        );
        assert_eq!(
            describe_data(&catalog.lookup("849"), Some("04")).as_deref(),
            Some("04")
        );
        assert_eq!(describe_data(&catalog.lookup("609"), None), None);
    }
}
