//! Collaborators behind the chat and search features

pub mod chat;
pub mod graph;
pub mod indexer;
pub mod openai;
pub mod search;

pub use chat::{ChatResponse, ChatService, Reference};
pub use graph::{GraphClient, GraphResult, title_search_query};
pub use indexer::Indexer;
pub use openai::OpenAiClient;
pub use search::{SearchClient, SearchDocument};
