// MIT License - Copyright (c) 2026 Peter Wright
// Command catalog: classification, display names and priorities

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{COMMAND_TABLE, CommandCode};
use crate::error::{Result, TpiError};

/// How a command's payload is shaped and routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Login,
    Partition,
    Zone,
    PartitionAndZone,
    LedState,
    Ack,
    Other,
}

/// Event priority, ordered `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TpiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(TpiError::config(format!("unknown priority: {other}"))),
        }
    }
}

pub const LOGIN_COMMANDS: &[CommandCode] = &[CommandCode::Login];

pub const ACK_COMMANDS: &[CommandCode] = &[CommandCode::CommandAcknowledge];

pub const LED_STATE_COMMANDS: &[CommandCode] =
    &[CommandCode::KeypadLedState, CommandCode::KeypadLedFlashState];

pub const PARTITION_COMMANDS: &[CommandCode] = &[
    CommandCode::PartitionReady,
    CommandCode::PartitionNotReady,
    CommandCode::PartitionArmed,
    CommandCode::PartitionReadyForceArmingEnabled,
    CommandCode::PartitionInAlarm,
    CommandCode::PartitionDisarmed,
    CommandCode::ExitDelayInProgress,
    CommandCode::EntryDelayInProgress,
    CommandCode::KeypadLockOut,
    CommandCode::PartitionFailedToArm,
    CommandCode::PgmOutputInProgress,
    CommandCode::ChimeEnabled,
    CommandCode::ChimeDisabled,
    CommandCode::InvalidAccessCode,
    CommandCode::FunctionNotAvailable,
    CommandCode::FailureToArm,
    CommandCode::PartitionIsBusy,
    CommandCode::SystemArmingInProgress,
    CommandCode::UserClosing,
    CommandCode::SpecialClosing,
    CommandCode::PartialClosing,
    CommandCode::UserOpening,
    CommandCode::SpecialOpening,
    CommandCode::TroubleLedOn,
    CommandCode::TroubleLedOff,
];

pub const PARTITION_AND_ZONE_COMMANDS: &[CommandCode] = &[
    CommandCode::ZoneAlarm,
    CommandCode::ZoneAlarmRestore,
    CommandCode::ZoneTamper,
    CommandCode::ZoneTamperRestore,
];

pub const ZONE_COMMANDS: &[CommandCode] = &[
    CommandCode::ZoneFault,
    CommandCode::ZoneFaultRestore,
    CommandCode::ZoneOpen,
    CommandCode::ZoneRestored,
    CommandCode::SoftwareZoneAlarm,
];

impl Classification {
    /// Classify a known code. Codes outside every named set are `Other`.
    pub fn of(code: CommandCode) -> Self {
        if LOGIN_COMMANDS.contains(&code) {
            Self::Login
        } else if ACK_COMMANDS.contains(&code) {
            Self::Ack
        } else if LED_STATE_COMMANDS.contains(&code) {
            Self::LedState
        } else if PARTITION_COMMANDS.contains(&code) {
            Self::Partition
        } else if ZONE_COMMANDS.contains(&code) {
            Self::Zone
        } else if PARTITION_AND_ZONE_COMMANDS.contains(&code) {
            Self::PartitionAndZone
        } else {
            Self::Other
        }
    }
}

/// A command as observed on the wire, resolved against the catalog.
///
/// Unknown codes keep their raw code and resolve to a synthetic "Unknown"
/// display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub code: String,
    pub known: Option<CommandCode>,
    pub classification: Classification,
    pub name: String,
    pub priority: Priority,
}

impl Command {
    pub fn is(&self, code: CommandCode) -> bool {
        self.known == Some(code)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.known.is_some() {
            f.write_str(&self.name)
        } else {
            write!(f, "<Unknown: [{}]>", self.code)
        }
    }
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    code: CommandCode,
    name: String,
    priority: Priority,
}

/// Read-only lookup table from wire code to command metadata.
///
/// Built once at startup from the static command table plus any configured
/// name and priority overrides.
#[derive(Debug, Clone)]
pub struct CommandCatalog {
    entries: HashMap<&'static str, CatalogEntry>,
}

impl Default for CommandCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandCatalog {
    pub fn new() -> Self {
        let entries = COMMAND_TABLE
            .iter()
            .map(|(code, name, priority)| {
                (
                    code.as_str(),
                    CatalogEntry {
                        code: *code,
                        name: name.to_string(),
                        priority: *priority,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Build a catalog with per-code display name and priority overrides.
    ///
    /// Overrides for codes the catalog does not know are rejected.
    pub fn with_overrides(
        names: &HashMap<String, String>,
        priorities: &HashMap<String, Priority>,
    ) -> Result<Self> {
        let mut catalog = Self::new();
        for (code, name) in names {
            let entry = catalog
                .entries
                .get_mut(code.as_str())
                .ok_or_else(|| TpiError::config(format!("name override for unknown command {code}")))?;
            entry.name = name.clone();
        }
        for (code, priority) in priorities {
            let entry = catalog
                .entries
                .get_mut(code.as_str())
                .ok_or_else(|| TpiError::config(format!("priority override for unknown command {code}")))?;
            entry.priority = *priority;
        }
        Ok(catalog)
    }

    /// Resolve a wire code. Never fails; unknown codes classify as `Other`
    /// with Low priority.
    pub fn lookup(&self, code: &str) -> Command {
        match self.entries.get(code) {
            Some(entry) => Command {
                code: code.to_string(),
                known: Some(entry.code),
                classification: Classification::of(entry.code),
                name: entry.name.clone(),
                priority: entry.priority,
            },
            None => Command {
                code: code.to_string(),
                known: None,
                classification: Classification::Other,
                name: "Unknown".to_string(),
                priority: Priority::Low,
            },
        }
    }

    pub fn command(&self, code: CommandCode) -> Command {
        self.lookup(code.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        assert!(Priority::High < Priority::Critical);
        assert!(Priority::Critical >= Priority::High);
    }

    #[test]
    fn test_priority_parse_and_display() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("critical".parse::<Priority>().unwrap(), Priority::Critical);
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(Priority::Medium.to_string(), "Medium");
    }

    #[test]
    fn test_panic_and_duress_alarms_are_not_low() {
        let catalog = CommandCatalog::new();
        assert_eq!(catalog.lookup("620").priority, Priority::Critical);
        for code in ["621", "623", "625", "631"] {
            assert_eq!(catalog.lookup(code).priority, Priority::High, "{code}");
        }
        for code in ["622", "624", "626", "632"] {
            assert_eq!(catalog.lookup(code).priority, Priority::Medium, "{code}");
        }
    }

    #[test]
    fn test_classification() {
        assert_eq!(Classification::of(CommandCode::Login), Classification::Login);
        assert_eq!(Classification::of(CommandCode::CommandAcknowledge), Classification::Ack);
        assert_eq!(Classification::of(CommandCode::ZoneOpen), Classification::Zone);
        assert_eq!(Classification::of(CommandCode::ZoneAlarm), Classification::PartitionAndZone);
        assert_eq!(Classification::of(CommandCode::PartitionArmed), Classification::Partition);
        assert_eq!(Classification::of(CommandCode::KeypadLedState), Classification::LedState);
        assert_eq!(Classification::of(CommandCode::PanelAcTrouble), Classification::Other);
    }

    #[test]
    fn test_lookup_known() {
        let catalog = CommandCatalog::new();
        let command = catalog.lookup("609");
        assert!(command.is(CommandCode::ZoneOpen));
        assert_eq!(command.name, "Zone Open");
        assert_eq!(command.classification, Classification::Zone);
        assert_eq!(command.priority, Priority::Low);

        let command = catalog.lookup("603");
        assert_eq!(command.priority, Priority::Critical);
    }

    #[test]
    fn test_lookup_unknown_keeps_raw_code() {
        let catalog = CommandCatalog::new();
        let command = catalog.lookup("999");
        assert_eq!(command.known, None);
        assert_eq!(command.code, "999");
        assert_eq!(command.classification, Classification::Other);
        assert_eq!(command.priority, Priority::Low);
        assert_eq!(command.to_string(), "<Unknown: [999]>");
    }

    #[test]
    fn test_overrides() {
        let names = HashMap::from([("505".to_string(), "LOGIN!".to_string())]);
        let priorities = HashMap::from([("609".to_string(), Priority::High)]);
        let catalog = CommandCatalog::with_overrides(&names, &priorities).unwrap();

        assert_eq!(catalog.lookup("505").to_string(), "LOGIN!");
        assert_eq!(catalog.lookup("609").priority, Priority::High);
        // Defaults are untouched elsewhere
        assert_eq!(catalog.lookup("610").name, "Zone Restored");
    }

    #[test]
    fn test_override_unknown_code_rejected() {
        let names = HashMap::from([("999".to_string(), "Nope".to_string())]);
        let result = CommandCatalog::with_overrides(&names, &HashMap::new());
        assert!(matches!(result, Err(TpiError::Config { .. })));
    }
}
