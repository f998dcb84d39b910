//! Report module - summarizing and exporting analysis results

pub mod export;
pub mod summary;

pub use export::*;
pub use summary::*;
