//! Terminal output: symbols, the package prefix palette, and summaries

pub mod output;
pub mod theme;

pub use theme::Symbols;
