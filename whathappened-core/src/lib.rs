//! # whathappened-core
//!
//! Core library for whathappened - reports what an OpenStreetMap changeset did
//! to a set of watched tags.
//!
//! This crate provides the changeset and versioned object model, lazy history
//! retrieval that tolerates redacted versions, the tag differ and the watch
//! evaluator tying them together.

pub mod changeset;
pub mod config;
pub mod diff;
pub mod error;
pub mod history;
pub mod models;
pub mod source;
pub mod watch;
mod xml;

pub use changeset::Changeset;
pub use config::Config;
pub use diff::{compare, TagChange, TagDiff};
pub use error::{Error, Result};
pub use history::{fetch_history, History};
pub use models::{OsmType, Tags, VersionedObject};
pub use source::{Document, HttpSource, OsmSource};
pub use watch::{evaluate, WatchEvaluator, WatchReport, WatchedChange};
