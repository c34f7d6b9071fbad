//! HTTP server: state, probes and the router.

pub mod health;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::{AppState, Repositories};
