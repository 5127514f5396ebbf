//! Terminal output helpers.

pub mod output;
pub mod table;

pub use output::Output;
