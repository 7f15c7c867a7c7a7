//! The gateway binary: policy gate (C2), ingest front (C3), and the read
//! half of query & analytics (C5). Account/project/API-key CRUD, health
//! checks, and dashboard-panel CRUD are external collaborators this
//! binary never implements — see `logflux-rpc::AuthCollaborator`.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::Settings;
pub use state::AppState;
