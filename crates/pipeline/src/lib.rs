pub mod aggregate;
pub mod context;
pub mod notify;
pub mod runner;

pub use aggregate::{EvidenceBundle, FindingsMap, aggregate};
pub use context::TransactionContext;
pub use runner::{Pipeline, Stage};
