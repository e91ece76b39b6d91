// MIT License - Copyright (c) 2026 Peter Wright
// Panel state payloads

pub mod keypad;
pub mod partition;
