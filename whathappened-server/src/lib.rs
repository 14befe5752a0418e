//! # whathappened-server
//!
//! HTTP front end for whathappened: `GET /whathappened/{changeset}/{watchfor}`
//! answers which watched tags the changeset touched.

pub mod api;
pub mod server;

pub use api::{create_router, AppState};
pub use server::WhathappenedServer;
