// MIT License - Copyright (c) 2026 Peter Wright
// Partition arm modes (command 652)

/// Arm mode reported in the residual data of a Partition Armed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmMode {
    /// `0` - Away
    Away,
    /// `1` - Stay
    Stay,
    /// `2` - Zero-entry away
    ZeroEntryAway,
    /// `3` - Zero-entry stay
    ZeroEntryStay,
}

impl ArmMode {
    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "0" => Some(Self::Away),
            "1" => Some(Self::Stay),
            "2" => Some(Self::ZeroEntryAway),
            "3" => Some(Self::ZeroEntryStay),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Away => "Away",
            Self::Stay => "Stay",
            Self::ZeroEntryAway => "Zero-Entry-Away",
            Self::ZeroEntryStay => "Zero-Entry-Stay",
        }
    }
}

/// Armed-state description for a partition after an arm or disarm event.
pub fn armed_description(mode: Option<ArmMode>) -> String {
    match mode {
        Some(mode) => format!("Armed ({})", mode.description()),
        None => "Armed".to_string(),
    }
}

pub const DISARMED: &str = "Disarmed";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_modes() {
        assert_eq!(ArmMode::from_code("0"), Some(ArmMode::Away));
        assert_eq!(ArmMode::from_code("3"), Some(ArmMode::ZeroEntryStay));
        assert_eq!(ArmMode::from_code("7"), None);
        assert_eq!(ArmMode::ZeroEntryAway.description(), "Zero-Entry-Away");
    }

    #[test]
    fn test_armed_description() {
        assert_eq!(armed_description(Some(ArmMode::Stay)), "Armed (Stay)");
        assert_eq!(armed_description(None), "Armed");
    }
}
