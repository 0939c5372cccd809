use crate::config::GraphConfig;
use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One value of a vertex property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexProperty {
    pub value: Value,
}

/// A vertex as returned by a Gremlin traversal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphVertex {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub properties: HashMap<String, Vec<VertexProperty>>,
}

impl GraphVertex {
    /// First value of the property `name`, as text
    pub fn property(&self, name: &str) -> Option<String> {
        let value = &self.properties.get(name)?.first()?.value;
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Items returned by a traversal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphResult {
    #[serde(rename = "_items", default)]
    pub items: Vec<GraphVertex>,
}

/// Product graph client.
///
/// There is no live graph connection yet; queries are logged and answer
/// with an empty result.
pub struct GraphClient {
    config: GraphConfig,
}

impl GraphClient {
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    pub async fn execute(&self, query: &str) -> Result<GraphResult, GraphError> {
        ::log::info!(
            "Executing Gremlin query on {}/{}: {}",
            self.config.database,
            self.config.graph,
            query
        );
        Ok(GraphResult::default())
    }
}

/// Traversal for up to three products whose title contains `query`,
/// case-insensitively
pub fn title_search_query(query: &str) -> String {
    let term = query.replace(['\'', '"'], "");
    format!(
        "g.V().hasLabel('product').has('title', textContainsRegex('(?i).*{}.*')).limit(3)",
        term
    )
}
