//! wsu - Workspace Script Utility
//!
//! Orchestrates lifecycle scripts across the packages of a JavaScript
//! monorepo: workspace discovery, dependency-ordered batched execution,
//! bounded parallelism with multiplexed logs, and a content-addressed
//! build cache under `.wsu/`.

pub mod cache;
pub mod cli;
pub mod error;
pub mod graph;
pub mod manager;
pub mod supervisor;
pub mod ui;
pub mod workspace;

pub use error::{WsuError, WsuResult};
