//! Grounder HTTP server library.
//!
//! Exposes the answering pipeline over two endpoints: a chunked streaming
//! answer (`POST /ask/stream`) and a read-only evidence listing
//! (`POST /ask/sources`). The binary in `main.rs` wires configuration,
//! providers, and CORS around these routes.

pub mod routes;
pub mod state;

pub use state::AppState;
