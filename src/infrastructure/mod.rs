pub mod audio;
pub mod llm;
pub mod observability;
pub mod persistence;
pub mod queue;
pub mod report;
pub mod retrieval;
pub mod speech;
pub mod storage;
