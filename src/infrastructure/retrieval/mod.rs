mod http_context_retriever;
mod in_memory_context_retriever;

pub use http_context_retriever::HttpContextRetriever;
pub use in_memory_context_retriever::InMemoryContextRetriever;
