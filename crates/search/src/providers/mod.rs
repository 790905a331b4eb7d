//! Search provider implementations.

pub mod brave;
pub mod tavily;

pub use brave::BraveSearch;
pub use tavily::TavilySearch;
