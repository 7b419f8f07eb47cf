// Data pipeline: path resolution, ingestion, processing, and storage

pub mod ingestion;
pub mod paths;
pub mod processing;
pub mod storage;

pub use paths::DataRoot;
