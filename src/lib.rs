//! # whathappened
//!
//! Reports which watched tags were created, modified or deleted by the objects
//! of an OpenStreetMap changeset.
//!
//! This crate re-exports the workspace members so applications can depend on a
//! single package.

pub use whathappened_core;
pub use whathappened_sdk;
pub use whathappened_server;

pub use whathappened_core::{evaluate, Error, OsmType, Result, WatchEvaluator, WatchReport};
