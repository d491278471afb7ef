pub mod baseline;
pub mod grounded;
pub mod prompt;

pub use baseline::BaselineAnswerer;
pub use grounded::{is_abstention, GroundedAnswerer};
