// MIT License - Copyright (c) 2026 Peter Wright
// Keypad LED state bitfield (commands 510 / 511)

use bitflags::bitflags;

bitflags! {
    /// Keypad LEDs reported as a two-digit hex bitfield.
    ///
    /// Bit positions: `0 Ready, 1 Armed, 2 Memory, 3 Bypass, 4 Trouble,
    /// 5 Program, 6 Fire, 7 Backlight`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LedState: u8 {
        const READY     = 0b0000_0001;
        const ARMED     = 0b0000_0010;
        const MEMORY    = 0b0000_0100;
        const BYPASS    = 0b0000_1000;
        const TROUBLE   = 0b0001_0000;
        const PROGRAM   = 0b0010_0000;
        const FIRE      = 0b0100_0000;
        const BACKLIGHT = 0b1000_0000;
    }
}

/// Most significant LED first, which is the order LEDs are described in.
const LED_NAMES: [(LedState, &str); 8] = [
    (LedState::BACKLIGHT, "Backlight"),
    (LedState::FIRE, "Fire"),
    (LedState::PROGRAM, "Program"),
    (LedState::TROUBLE, "Trouble"),
    (LedState::BYPASS, "Bypass"),
    (LedState::MEMORY, "Memory"),
    (LedState::ARMED, "Armed"),
    (LedState::READY, "Ready"),
];

impl LedState {
    /// Parse the hex payload of an LED state frame (e.g. "83").
    pub fn from_hex(s: &str) -> Option<Self> {
        u8::from_str_radix(s.trim(), 16).ok().map(Self::from_bits_retain)
    }

    /// Names of the LEDs that are lit, most significant first.
    pub fn names(&self) -> Vec<&'static str> {
        LED_NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }

    pub fn describe(&self) -> String {
        self.names().join(", ")
    }
}
