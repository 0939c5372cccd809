use crate::services::graph::{GraphClient, GraphVertex, title_search_query};
use crate::services::openai::OpenAiClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A page the answer drew on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
    pub references: Vec<Reference>,
}

/// Answers visitor questions from product graph context and the LLM
pub struct ChatService {
    llm: Arc<OpenAiClient>,
    graph: GraphClient,
}

impl ChatService {
    pub fn new(llm: Arc<OpenAiClient>, graph: GraphClient) -> Self {
        Self { llm, graph }
    }

    /// Never fails: a graph error leaves the context empty and an LLM error
    /// becomes an apology
    pub async fn answer(&self, query: &str) -> ChatResponse {
        let (context, references) = match self.graph.execute(&title_search_query(query)).await {
            Ok(result) => product_context(&result.items),
            Err(e) => {
                ::log::error!("Error querying graph database: {}", e);
                (String::new(), Vec::new())
            }
        };

        let text = self.llm.generate(query, &context).await;
        ChatResponse { text, references }
    }
}

/// Prompt context and references for the matched products
pub fn product_context(items: &[GraphVertex]) -> (String, Vec<Reference>) {
    let mut references = Vec::with_capacity(items.len());
    let blocks = items
        .iter()
        .map(|item| {
            let title = item
                .property("title")
                .unwrap_or_else(|| "Unknown Product".to_string());
            let content = item.property("content").unwrap_or_default();
            references.push(Reference {
                title: title.clone(),
                url: item.property("url").unwrap_or_default(),
            });
            format!("Product: {}\nDescription: {}\n", title, content)
        })
        .collect::<Vec<_>>();

    (blocks.join("\n"), references)
}
