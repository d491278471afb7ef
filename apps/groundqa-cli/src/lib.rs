//! Wiring and terminal presentation for the `groundqa` binary.

pub mod render;
pub mod wiring;
