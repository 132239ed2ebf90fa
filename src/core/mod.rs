//! Core business logic abstractions

pub mod analytics;
pub mod config;
pub mod instrument;
pub mod log;
pub mod normalize;
pub mod quote;
pub mod refresh;
pub mod resolver;
pub mod store;

// Re-export main types for cleaner imports
pub use instrument::{Instrument, InstrumentType};
pub use quote::{MarketQuote, ProviderError, QuoteProvider, SearchResult};
pub use resolver::{FailoverResolver, ResolveError};
pub use store::{PortfolioStore, StoreError};
