// MIT License - Copyright (c) 2026 Peter Wright
// Transient tasks driven by the event stream

pub mod silent_arm;

pub use silent_arm::{SILENT_ARM_KEY, SilentArmTask};
