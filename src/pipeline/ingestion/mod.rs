// Pipeline ingestion: artifact resolution, on-disk formats, schema checks, and loaders

pub mod artifacts;
pub mod documents;
pub mod formats;
pub mod loaders;
pub mod schema;

pub use documents::{ChannelsConfig, ResearchEnrichment};
pub use schema::validate_schema;
