// Pipeline processing: referential filtering, exclusions, ranking, and quality gates

pub mod exclusions;
pub mod merge;
pub mod provenance;
pub mod quality_gate;
pub mod referential;
pub mod rerank;

pub use exclusions::{apply_exclusions, ExclusionConfig};
pub use referential::{filter_orphans, CompanyIndex};
pub use rerank::rerank_segments;
