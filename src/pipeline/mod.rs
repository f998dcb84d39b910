//! Pipeline module - orchestrates the analysis steps

pub mod collinearity;
pub mod correlation;
pub mod impute;
pub mod join;
pub mod loader;
pub mod normalize;
pub mod summary;

pub use collinearity::*;
pub use correlation::*;
pub use impute::*;
pub use join::*;
pub use loader::*;
pub use normalize::*;
pub use summary::*;
