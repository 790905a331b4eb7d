//! Web search integration for the grounder service.
//!
//! Search engines are consumed through the [`SearchProvider`] trait: a
//! query in, an ordered list of raw results out. Providers may return
//! fewer results than requested; any transport or payload failure surfaces
//! as `AppError::Retrieval`.
//!
//! # Providers
//! - **Tavily** (default)
//! - **Brave**

pub mod factory;
pub mod provider;
pub mod providers;
pub mod types;

// Re-export main types
pub use factory::create_provider;
pub use provider::SearchProvider;
pub use providers::{BraveSearch, TavilySearch};
pub use types::RawResult;
