// MIT License - Copyright (c) 2026 Peter Wright
// TPI command codes and protocol constants

use std::time::Duration;

use crate::catalog::Priority;

/// Default TCP port of the EnvisaLink TPI server.
pub const DEFAULT_PORT: u16 = 4025;

/// Frame terminator on the wire.
pub const CRLF: &str = "\r\n";

/// Bytes requested per socket read.
pub const READ_CHUNK_SIZE: usize = 512;

/// How long the send loop waits for a command acknowledgement.
pub const ACK_TIMEOUT: Duration = Duration::from_secs(2);

/// Capacity of the raw frame channel between the receive and dispatch tasks.
pub const FRAME_CHANNEL_CAPACITY: usize = 256;

/// Width of the partition id at the start of a partition payload.
pub const PARTITION_ID_WIDTH: usize = 1;

/// Width of the zone id in a zone payload.
pub const ZONE_ID_WIDTH: usize = 3;

/// Every command code known to the catalog.
///
/// Codes below 500 are sent by the client; the rest are reported by the panel.
/// `S01` is synthetic and only ever produced locally (silent-arm task).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCode {
    /// `000` - Poll
    Poll,
    /// `001` - Status Report
    StatusReport,
    /// `005` - Network Login
    NetworkLogin,
    /// `500` - Command Acknowledge
    CommandAcknowledge,
    /// `501` - Command Error
    CommandError,
    /// `502` - System Error
    SystemError,
    /// `505` - Login
    Login,
    /// `510` - Keypad LED State
    KeypadLedState,
    /// `511` - Keypad LED Flash State
    KeypadLedFlashState,
    /// `601` - Zone Alarm
    ZoneAlarm,
    /// `602` - Zone Alarm Restore
    ZoneAlarmRestore,
    /// `603` - Zone Tamper
    ZoneTamper,
    /// `604` - Zone Tamper Restore
    ZoneTamperRestore,
    /// `605` - Zone Fault
    ZoneFault,
    /// `606` - Zone Fault Restore
    ZoneFaultRestore,
    /// `609` - Zone Open
    ZoneOpen,
    /// `610` - Zone Restored
    ZoneRestored,
    /// `615` - EnvisaLink Zone Timer Dump
    EnvisalinkZoneTimerDump,
    /// `616` - Bypassed Zones Bitfield Dump
    BypassedZonesBitfieldDump,
    /// `620` - Duress Alarm
    DuressAlarm,
    /// `621` - [F] Key Alarm
    FKeyAlarm,
    /// `622` - [F] Key Restore
    FKeyRestore,
    /// `623` - [A] Key Alarm
    AKeyAlarm,
    /// `624` - [A] Key Restore
    AKeyRestore,
    /// `625` - [P] Key Alarm
    PKeyAlarm,
    /// `626` - [P] Key Restore
    PKeyRestore,
    /// `631` - 2-Wire Smoke/Aux Alarm
    SmokeAuxAlarm,
    /// `632` - 2-Wire Smoke/Aux Restore
    SmokeAuxRestore,
    /// `650` - Partition Ready
    PartitionReady,
    /// `651` - Partition Not Ready
    PartitionNotReady,
    /// `652` - Partition Armed
    PartitionArmed,
    /// `653` - Partition Ready - Force Arming Enabled
    PartitionReadyForceArmingEnabled,
    /// `654` - Partition In Alarm
    PartitionInAlarm,
    /// `655` - Partition Disarmed
    PartitionDisarmed,
    /// `656` - Exit Delay in Progress
    ExitDelayInProgress,
    /// `657` - Entry Delay in Progress
    EntryDelayInProgress,
    /// `658` - Keypad Lock-out
    KeypadLockOut,
    /// `659` - Partition Failed to Arm
    PartitionFailedToArm,
    /// `660` - PGM Output is in Progress
    PgmOutputInProgress,
    /// `663` - Chime Enabled
    ChimeEnabled,
    /// `664` - Chime Disabled
    ChimeDisabled,
    /// `670` - Invalid Access Code
    InvalidAccessCode,
    /// `671` - Function Not Available
    FunctionNotAvailable,
    /// `672` - Failure to Arm
    FailureToArm,
    /// `673` - Partition is Busy
    PartitionIsBusy,
    /// `674` - System Arming in Progress
    SystemArmingInProgress,
    /// `680` - System in Installers Mode
    SystemInInstallersMode,
    /// `700` - User Closing
    UserClosing,
    /// `701` - Special Closing
    SpecialClosing,
    /// `702` - Partial Closing
    PartialClosing,
    /// `750` - User Opening
    UserOpening,
    /// `751` - Special Opening
    SpecialOpening,
    /// `800` - Panel Battery Trouble
    PanelBatteryTrouble,
    /// `801` - Panel Battery Trouble Restore
    PanelBatteryTroubleRestore,
    /// `802` - Panel AC Trouble
    PanelAcTrouble,
    /// `803` - Panel AC Restore
    PanelAcRestore,
    /// `806` - System Bell Trouble
    SystemBellTrouble,
    /// `807` - System Bell Trouble Restore
    SystemBellTroubleRestore,
    /// `814` - FTC Trouble
    FtcTrouble,
    /// `815` - FTC Trouble Restore
    FtcTroubleRestore,
    /// `816` - Buffer Near Full
    BufferNearFull,
    /// `829` - General System Tamper
    GeneralSystemTamper,
    /// `830` - General System Tamper Restore
    GeneralSystemTamperRestore,
    /// `840` - Trouble LED On
    TroubleLedOn,
    /// `841` - Trouble LED Off
    TroubleLedOff,
    /// `842` - Fire Trouble Alarm
    FireTroubleAlarm,
    /// `843` - Fire Trouble Alarm Restore
    FireTroubleAlarmRestore,
    /// `849` - Verbose Trouble Status
    VerboseTroubleStatus,
    /// `900` - Code Required
    CodeRequired,
    /// `912` - Command Output Pressed
    CommandOutputPressed,
    /// `921` - Master Code Required
    MasterCodeRequired,
    /// `922` - Installers Code Required
    InstallersCodeRequired,
    /// `S01` - Software Zone Alarm
    SoftwareZoneAlarm,
}

impl CommandCode {
    /// Parse a three-character wire code.
    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "000" => Some(Self::Poll),
            "001" => Some(Self::StatusReport),
            "005" => Some(Self::NetworkLogin),
            "500" => Some(Self::CommandAcknowledge),
            "501" => Some(Self::CommandError),
            "502" => Some(Self::SystemError),
            "505" => Some(Self::Login),
            "510" => Some(Self::KeypadLedState),
            "511" => Some(Self::KeypadLedFlashState),
            "601" => Some(Self::ZoneAlarm),
            "602" => Some(Self::ZoneAlarmRestore),
            "603" => Some(Self::ZoneTamper),
            "604" => Some(Self::ZoneTamperRestore),
            "605" => Some(Self::ZoneFault),
            "606" => Some(Self::ZoneFaultRestore),
            "609" => Some(Self::ZoneOpen),
            "610" => Some(Self::ZoneRestored),
            "615" => Some(Self::EnvisalinkZoneTimerDump),
            "616" => Some(Self::BypassedZonesBitfieldDump),
            "620" => Some(Self::DuressAlarm),
            "621" => Some(Self::FKeyAlarm),
            "622" => Some(Self::FKeyRestore),
            "623" => Some(Self::AKeyAlarm),
            "624" => Some(Self::AKeyRestore),
            "625" => Some(Self::PKeyAlarm),
            "626" => Some(Self::PKeyRestore),
            "631" => Some(Self::SmokeAuxAlarm),
            "632" => Some(Self::SmokeAuxRestore),
            "650" => Some(Self::PartitionReady),
            "651" => Some(Self::PartitionNotReady),
            "652" => Some(Self::PartitionArmed),
            "653" => Some(Self::PartitionReadyForceArmingEnabled),
            "654" => Some(Self::PartitionInAlarm),
            "655" => Some(Self::PartitionDisarmed),
            "656" => Some(Self::ExitDelayInProgress),
            "657" => Some(Self::EntryDelayInProgress),
            "658" => Some(Self::KeypadLockOut),
            "659" => Some(Self::PartitionFailedToArm),
            "660" => Some(Self::PgmOutputInProgress),
            "663" => Some(Self::ChimeEnabled),
            "664" => Some(Self::ChimeDisabled),
            "670" => Some(Self::InvalidAccessCode),
            "671" => Some(Self::FunctionNotAvailable),
            "672" => Some(Self::FailureToArm),
            "673" => Some(Self::PartitionIsBusy),
            "674" => Some(Self::SystemArmingInProgress),
            "680" => Some(Self::SystemInInstallersMode),
            "700" => Some(Self::UserClosing),
            "701" => Some(Self::SpecialClosing),
            "702" => Some(Self::PartialClosing),
            "750" => Some(Self::UserOpening),
            "751" => Some(Self::SpecialOpening),
            "800" => Some(Self::PanelBatteryTrouble),
            "801" => Some(Self::PanelBatteryTroubleRestore),
            "802" => Some(Self::PanelAcTrouble),
            "803" => Some(Self::PanelAcRestore),
            "806" => Some(Self::SystemBellTrouble),
            "807" => Some(Self::SystemBellTroubleRestore),
            "814" => Some(Self::FtcTrouble),
            "815" => Some(Self::FtcTroubleRestore),
            "816" => Some(Self::BufferNearFull),
            "829" => Some(Self::GeneralSystemTamper),
            "830" => Some(Self::GeneralSystemTamperRestore),
            "840" => Some(Self::TroubleLedOn),
            "841" => Some(Self::TroubleLedOff),
            "842" => Some(Self::FireTroubleAlarm),
            "843" => Some(Self::FireTroubleAlarmRestore),
            "849" => Some(Self::VerboseTroubleStatus),
            "900" => Some(Self::CodeRequired),
            "912" => Some(Self::CommandOutputPressed),
            "921" => Some(Self::MasterCodeRequired),
            "922" => Some(Self::InstallersCodeRequired),
            "S01" => Some(Self::SoftwareZoneAlarm),
            _ => None,
        }
    }

    /// The wire string representation (e.g. "505").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Poll => "000",
            Self::StatusReport => "001",
            Self::NetworkLogin => "005",
            Self::CommandAcknowledge => "500",
            Self::CommandError => "501",
            Self::SystemError => "502",
            Self::Login => "505",
            Self::KeypadLedState => "510",
            Self::KeypadLedFlashState => "511",
            Self::ZoneAlarm => "601",
            Self::ZoneAlarmRestore => "602",
            Self::ZoneTamper => "603",
            Self::ZoneTamperRestore => "604",
            Self::ZoneFault => "605",
            Self::ZoneFaultRestore => "606",
            Self::ZoneOpen => "609",
            Self::ZoneRestored => "610",
            Self::EnvisalinkZoneTimerDump => "615",
            Self::BypassedZonesBitfieldDump => "616",
            Self::DuressAlarm => "620",
            Self::FKeyAlarm => "621",
            Self::FKeyRestore => "622",
            Self::AKeyAlarm => "623",
            Self::AKeyRestore => "624",
            Self::PKeyAlarm => "625",
            Self::PKeyRestore => "626",
            Self::SmokeAuxAlarm => "631",
            Self::SmokeAuxRestore => "632",
            Self::PartitionReady => "650",
            Self::PartitionNotReady => "651",
            Self::PartitionArmed => "652",
            Self::PartitionReadyForceArmingEnabled => "653",
            Self::PartitionInAlarm => "654",
            Self::PartitionDisarmed => "655",
            Self::ExitDelayInProgress => "656",
            Self::EntryDelayInProgress => "657",
            Self::KeypadLockOut => "658",
            Self::PartitionFailedToArm => "659",
            Self::PgmOutputInProgress => "660",
            Self::ChimeEnabled => "663",
            Self::ChimeDisabled => "664",
            Self::InvalidAccessCode => "670",
            Self::FunctionNotAvailable => "671",
            Self::FailureToArm => "672",
            Self::PartitionIsBusy => "673",
            Self::SystemArmingInProgress => "674",
            Self::SystemInInstallersMode => "680",
            Self::UserClosing => "700",
            Self::SpecialClosing => "701",
            Self::PartialClosing => "702",
            Self::UserOpening => "750",
            Self::SpecialOpening => "751",
            Self::PanelBatteryTrouble => "800",
            Self::PanelBatteryTroubleRestore => "801",
            Self::PanelAcTrouble => "802",
            Self::PanelAcRestore => "803",
            Self::SystemBellTrouble => "806",
            Self::SystemBellTroubleRestore => "807",
            Self::FtcTrouble => "814",
            Self::FtcTroubleRestore => "815",
            Self::BufferNearFull => "816",
            Self::GeneralSystemTamper => "829",
            Self::GeneralSystemTamperRestore => "830",
            Self::TroubleLedOn => "840",
            Self::TroubleLedOff => "841",
            Self::FireTroubleAlarm => "842",
            Self::FireTroubleAlarmRestore => "843",
            Self::VerboseTroubleStatus => "849",
            Self::CodeRequired => "900",
            Self::CommandOutputPressed => "912",
            Self::MasterCodeRequired => "921",
            Self::InstallersCodeRequired => "922",
            Self::SoftwareZoneAlarm => "S01",
        }
    }
}

impl std::fmt::Display for CommandCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display name and default priority for every known code.
///
/// Alarm, tamper, trouble and error conditions default to High or Critical;
/// routine status reports stay Low or Medium.
pub const COMMAND_TABLE: &[(CommandCode, &str, Priority)] = &[
    (CommandCode::Poll, "Poll", Priority::Low),
    (CommandCode::StatusReport, "Status Report", Priority::Low),
    (CommandCode::NetworkLogin, "Network Login", Priority::Low),
    (CommandCode::CommandAcknowledge, "Command Acknowledge", Priority::Low),
    (CommandCode::CommandError, "Command Error", Priority::Critical),
    (CommandCode::SystemError, "System Error", Priority::Critical),
    (CommandCode::Login, "Login", Priority::Medium),
    (CommandCode::KeypadLedState, "Keypad LED State", Priority::Low),
    (CommandCode::KeypadLedFlashState, "Keypad LED Flash State", Priority::Low),
    (CommandCode::ZoneAlarm, "Zone Alarm", Priority::High),
    (CommandCode::ZoneAlarmRestore, "Zone Alarm Restore", Priority::Medium),
    (CommandCode::ZoneTamper, "Zone Tamper", Priority::Critical),
    (CommandCode::ZoneTamperRestore, "Zone Tamper Restore", Priority::Medium),
    (CommandCode::ZoneFault, "Zone Fault", Priority::Critical),
    (CommandCode::ZoneFaultRestore, "Zone Fault Restore", Priority::Medium),
    (CommandCode::ZoneOpen, "Zone Open", Priority::Low),
    (CommandCode::ZoneRestored, "Zone Restored", Priority::Medium),
    (CommandCode::EnvisalinkZoneTimerDump, "EnvisaLink Zone Timer Dump", Priority::Low),
    (CommandCode::BypassedZonesBitfieldDump, "Bypassed Zones Bitfield Dump", Priority::Low),
    (CommandCode::DuressAlarm, "Duress Alarm", Priority::Critical),
    (CommandCode::FKeyAlarm, "[F] Key Alarm", Priority::High),
    (CommandCode::FKeyRestore, "[F] Key Restore", Priority::Medium),
    (CommandCode::AKeyAlarm, "[A] Key Alarm", Priority::High),
    (CommandCode::AKeyRestore, "[A] Key Restore", Priority::Medium),
    (CommandCode::PKeyAlarm, "[P] Key Alarm", Priority::High),
    (CommandCode::PKeyRestore, "[P] Key Restore", Priority::Medium),
    (CommandCode::SmokeAuxAlarm, "2-Wire Smoke/Aux Alarm", Priority::High),
    (CommandCode::SmokeAuxRestore, "2-Wire Smoke/Aux Restore", Priority::Medium),
    (CommandCode::PartitionReady, "Partition Ready", Priority::Low),
    (CommandCode::PartitionNotReady, "Partition Not Ready", Priority::Low),
    (CommandCode::PartitionArmed, "Partition Armed", Priority::Medium),
    (CommandCode::PartitionReadyForceArmingEnabled, "Partition Ready - Force Arming Enabled", Priority::Low),
    (CommandCode::PartitionInAlarm, "Partition In Alarm", Priority::High),
    (CommandCode::PartitionDisarmed, "Partition Disarmed", Priority::Medium),
    (CommandCode::ExitDelayInProgress, "Exit Delay in Progress", Priority::Medium),
    (CommandCode::EntryDelayInProgress, "Entry Delay in Progress", Priority::Medium),
    (CommandCode::KeypadLockOut, "Keypad Lock-out", Priority::High),
    (CommandCode::PartitionFailedToArm, "Partition Failed to Arm", Priority::High),
    (CommandCode::PgmOutputInProgress, "PGM Output is in Progress", Priority::Low),
    (CommandCode::ChimeEnabled, "Chime Enabled", Priority::Low),
    (CommandCode::ChimeDisabled, "Chime Disabled", Priority::Low),
    (CommandCode::InvalidAccessCode, "Invalid Access Code", Priority::High),
    (CommandCode::FunctionNotAvailable, "Function Not Available", Priority::High),
    (CommandCode::FailureToArm, "Failure to Arm", Priority::High),
    (CommandCode::PartitionIsBusy, "Partition is Busy", Priority::Medium),
    (CommandCode::SystemArmingInProgress, "System Arming in Progress", Priority::Medium),
    (CommandCode::SystemInInstallersMode, "System in Installers Mode", Priority::High),
    (CommandCode::UserClosing, "User Closing", Priority::Medium),
    (CommandCode::SpecialClosing, "Special Closing", Priority::Medium),
    (CommandCode::PartialClosing, "Partial Closing", Priority::Medium),
    (CommandCode::UserOpening, "User Opening", Priority::Medium),
    (CommandCode::SpecialOpening, "Special Opening", Priority::Medium),
    (CommandCode::PanelBatteryTrouble, "Panel Battery Trouble", Priority::Critical),
    (CommandCode::PanelBatteryTroubleRestore, "Panel Battery Trouble Restore", Priority::Medium),
    (CommandCode::PanelAcTrouble, "Panel AC Trouble", Priority::Critical),
    (CommandCode::PanelAcRestore, "Panel AC Restore", Priority::Medium),
    (CommandCode::SystemBellTrouble, "System Bell Trouble", Priority::Critical),
    (CommandCode::SystemBellTroubleRestore, "System Bell Trouble Restore", Priority::Medium),
    (CommandCode::FtcTrouble, "FTC Trouble", Priority::Critical),
    (CommandCode::FtcTroubleRestore, "FTC Trouble Restore", Priority::Low),
    (CommandCode::BufferNearFull, "Buffer Near Full", Priority::Critical),
    (CommandCode::GeneralSystemTamper, "General System Tamper", Priority::Critical),
    (CommandCode::GeneralSystemTamperRestore, "General System Tamper Restore", Priority::Medium),
    (CommandCode::TroubleLedOn, "Trouble LED On", Priority::Critical),
    (CommandCode::TroubleLedOff, "Trouble LED Off", Priority::Medium),
    (CommandCode::FireTroubleAlarm, "Fire Trouble Alarm", Priority::High),
    (CommandCode::FireTroubleAlarmRestore, "Fire Trouble Alarm Restore", Priority::Medium),
    (CommandCode::VerboseTroubleStatus, "Verbose Trouble Status", Priority::Critical),
    (CommandCode::CodeRequired, "Code Required", Priority::High),
    (CommandCode::CommandOutputPressed, "Command Output Pressed", Priority::High),
    (CommandCode::MasterCodeRequired, "Master Code Required", Priority::High),
    (CommandCode::InstallersCodeRequired, "Installers Code Required", Priority::High),
    (CommandCode::SoftwareZoneAlarm, "Software Zone Alarm", Priority::High),
];

/// Sub-codes carried in the data field of a Login (505) frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginType {
    /// `0` - Password provided was incorrect
    IncorrectPassword,
    /// `1` - Password correct, session established
    LoginSuccess,
    /// `2` - Time out; password was not sent within 10 seconds
    LoginTimeout,
    /// `3` - Panel is requesting the password
    PasswordRequest,
}

impl LoginType {
    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "0" => Some(Self::IncorrectPassword),
            "1" => Some(Self::LoginSuccess),
            "2" => Some(Self::LoginTimeout),
            "3" => Some(Self::PasswordRequest),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::IncorrectPassword => "Incorrect Password",
            Self::LoginSuccess => "Login Successful",
            Self::LoginTimeout => "Login Timed Out",
            Self::PasswordRequest => "Password Request",
        }
    }
}
