use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::services::openai::EMBEDDING_DIMENSIONS;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Documents per upload request
pub const UPLOAD_BATCH_SIZE: usize = 100;

/// One page as stored in the search index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub id: String,
    pub url: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub keywords: Vec<String>,
    pub description: String,
    #[serde(rename = "vectorField")]
    pub vector_field: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct IndexAction<'a> {
    #[serde(rename = "@search.action")]
    action: &'static str,
    #[serde(flatten)]
    document: &'a SearchDocument,
}

/// Client for one index of a managed search service
pub struct SearchClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    index_name: String,
    api_version: String,
}

impl SearchClient {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or(SearchError::ConfigurationMissing("AZURE_SEARCH_ENDPOINT"))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or(SearchError::ConfigurationMissing("AZURE_SEARCH_API_KEY"))?;

        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            index_name: config.index_name.clone(),
            api_version: config.api_version.clone(),
        })
    }

    fn url(&self, suffix: &str) -> String {
        format!(
            "{}/indexes/{}{}?api-version={}",
            self.endpoint, self.index_name, suffix, self.api_version
        )
    }

    /// Create the index unless it already exists
    pub async fn ensure_index(&self) -> Result<(), SearchError> {
        let url = self.url("");
        let response = self
            .http
            .get(&url)
            .header("api-key", &self.api_key)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                ::log::info!("Search index '{}' already exists", self.index_name);
                return Ok(());
            }
            reqwest::StatusCode::NOT_FOUND => {}
            status => {
                return Err(SearchError::Status {
                    operation: "Index lookup".to_string(),
                    status: status.as_u16(),
                });
            }
        }

        ::log::info!("Creating search index '{}'...", self.index_name);
        let response = self
            .http
            .put(&url)
            .header("api-key", &self.api_key)
            .json(&index_definition(&self.index_name))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SearchError::Status {
                operation: "Index creation".to_string(),
                status: response.status().as_u16(),
            });
        }

        ::log::info!("Search index '{}' created successfully", self.index_name);
        Ok(())
    }

    /// Upload `documents`, replacing any with the same key
    pub async fn upload_documents(&self, documents: &[SearchDocument]) -> Result<(), SearchError> {
        let url = self.url("/docs/index");
        let batches = documents.len().div_ceil(UPLOAD_BATCH_SIZE);

        for (i, batch) in documents.chunks(UPLOAD_BATCH_SIZE).enumerate() {
            let actions = batch
                .iter()
                .map(|document| IndexAction {
                    action: "upload",
                    document,
                })
                .collect::<Vec<_>>();

            let response = self
                .http
                .post(&url)
                .header("api-key", &self.api_key)
                .json(&json!({ "value": actions }))
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(SearchError::Status {
                    operation: format!("Upload of batch {}", i + 1),
                    status: response.status().as_u16(),
                });
            }

            ::log::info!("Uploaded batch {} of {}", i + 1, batches);
        }

        Ok(())
    }
}

/// Field layout, vector profile and semantic ranking of the page index
pub fn index_definition(name: &str) -> Value {
    json!({
        "name": name,
        "fields": [
            { "name": "id", "type": "Edm.String", "key": true, "searchable": false, "filterable": false, "facetable": false, "sortable": false },
            { "name": "url", "type": "Edm.String", "searchable": true, "filterable": true, "facetable": false, "sortable": false },
            { "name": "title", "type": "Edm.String", "searchable": true, "filterable": true, "facetable": false, "sortable": true },
            { "name": "content", "type": "Edm.String", "searchable": true, "filterable": false, "facetable": false, "sortable": false },
            { "name": "category", "type": "Edm.String", "searchable": true, "filterable": true, "facetable": true, "sortable": true },
            { "name": "keywords", "type": "Collection(Edm.String)", "searchable": true, "filterable": true, "facetable": true, "sortable": false },
            { "name": "description", "type": "Edm.String", "searchable": true, "filterable": false, "facetable": false, "sortable": false },
            {
                "name": "vectorField",
                "type": "Collection(Edm.Single)",
                "dimensions": EMBEDDING_DIMENSIONS,
                "vectorSearchProfile": "vector-profile"
            }
        ],
        "vectorSearch": {
            "profiles": [
                { "name": "vector-profile", "algorithm": "hnsw", "algorithmConfiguration": "default" }
            ],
            "algorithmConfigurations": [
                {
                    "name": "default",
                    "kind": "hnsw",
                    "parameters": { "m": 4, "efConstruction": 400, "efSearch": 500, "metric": "cosine" }
                }
            ]
        },
        "semantic": {
            "configurations": [
                {
                    "name": "page-semantic-config",
                    "prioritizedFields": {
                        "titleField": { "fieldName": "title" },
                        "contentFields": [{ "fieldName": "content" }, { "fieldName": "description" }],
                        "keywordsFields": [{ "fieldName": "keywords" }]
                    }
                }
            ]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn client(server: &MockServer) -> SearchClient {
        SearchClient::new(&SearchConfig {
            endpoint: Some(server.uri()),
            api_key: Some("search-key".to_string()),
            ..SearchConfig::default()
        })
        .unwrap()
    }

    fn document(i: usize) -> SearchDocument {
        SearchDocument {
            id: format!("page{}", i),
            url: format!("https://www.example.com/page{}", i),
            title: format!("Page {}", i),
            content: "Content".to_string(),
            category: "unknown".to_string(),
            keywords: vec!["cocoa".to_string()],
            description: String::new(),
            vector_field: vec![0.5, -0.5],
        }
    }

    #[test]
    fn test_requires_endpoint_and_key() {
        assert!(matches!(
            SearchClient::new(&SearchConfig::default()),
            Err(SearchError::ConfigurationMissing(_))
        ));
    }

    #[test]
    fn test_index_action_is_flat() {
        let doc = document(1);
        let value = serde_json::to_value(IndexAction {
            action: "upload",
            document: &doc,
        })
        .unwrap();

        assert_eq!(value["@search.action"], "upload");
        assert_eq!(value["id"], "page1");
        assert_eq!(value["vectorField"], json!([0.5, -0.5]));
    }

    #[test]
    fn test_index_definition_vector_field() {
        let definition = index_definition("products-index");
        let fields = definition["fields"].as_array().unwrap();
        let vector = fields.iter().find(|f| f["name"] == "vectorField").unwrap();

        assert_eq!(vector["dimensions"], 1536);
        assert_eq!(fields.iter().filter(|f| f["key"] == true).count(), 1);
    }

    #[tokio::test]
    async fn test_ensure_index_creates_when_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/products-index"))
            .and(query_param("api-version", "2023-11-01"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/indexes/products-index"))
            .and(header("api-key", "search-key"))
            .and(body_partial_json(json!({ "name": "products-index" })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).ensure_index().await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_index_keeps_existing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "products-index" })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        client(&server).ensure_index().await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_in_batches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/indexes/products-index/docs/index"))
            .respond_with(ResponseTemplate::new(200))
            .expect(3)
            .mount(&server)
            .await;

        let documents = (0..250).map(document).collect::<Vec<_>>();
        client(&server).upload_documents(&documents).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let sizes = requests
            .iter()
            .map(|r: &Request| {
                let body: Value = serde_json::from_slice(&r.body).unwrap();
                body["value"].as_array().unwrap().len()
            })
            .collect::<Vec<_>>();
        assert_eq!(sizes, vec![100, 100, 50]);
    }
}
