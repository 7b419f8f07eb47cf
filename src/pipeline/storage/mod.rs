// Pipeline storage: in-process memoization of loaded artifacts

pub mod cache;

pub use cache::TtlCache;
