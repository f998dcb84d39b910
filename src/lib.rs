//! Auric: gold price analysis library
//!
//! A library for exploring the relationship between gold prices and
//! World Development Indicators: tidying the raw sources, correlation
//! analysis, collinearity reduction, Random Forest imputation and modelling.

pub mod cli;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod utils;
