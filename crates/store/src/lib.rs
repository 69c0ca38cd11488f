pub mod graph;
pub mod knowledge_base;

pub use graph::{GraphStore, HistoryMap};
pub use knowledge_base::KnowledgeBase;
