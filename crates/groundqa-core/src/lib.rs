//! groundqa-core
//!
//! Domain types, trait seams, configuration and the pure parts of the answer
//! pipeline (citation summaries, corpus chunking). Engines live in sibling
//! crates and plug in through [`traits`].

pub mod citations;
pub mod config;
pub mod data_processor;
pub mod error;
pub mod traits;
pub mod types;

pub use citations::summarize;
pub use error::{Error, Result};
