use crate::error::StoreError;
use crate::results::{CrawlIndex, PageRecord};
use crate::storage::{ContentStore, INDEX_PREFIX};
use crate::utils::timestamp_from_key;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::StatusCode;
use std::time::Duration;

/// Blob service REST version sent with every request
const API_VERSION: &str = "2021-08-06";

/// Endpoint and SAS token taken from a storage connection string
#[derive(Debug, Clone, PartialEq)]
pub struct BlobConnection {
    /// Blob service endpoint without a trailing slash
    pub endpoint: String,
    /// Shared access signature query, without a leading `?`
    pub sas: String,
}

impl BlobConnection {
    /// Parse `Key=Value;...` connection strings.
    ///
    /// The endpoint comes from `BlobEndpoint`, or is derived from
    /// `AccountName`, `EndpointSuffix` and `DefaultEndpointsProtocol`.
    /// Requests are authorised with `SharedAccessSignature`.
    pub fn parse(connection_string: &str) -> Result<Self, StoreError> {
        let mut blob_endpoint = None;
        let mut sas = None;
        let mut account = None;
        let mut suffix = "core.windows.net".to_string();
        let mut protocol = "https".to_string();

        for part in connection_string.split(';') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let value = value.trim().to_string();
            match key.trim() {
                "BlobEndpoint" => blob_endpoint = Some(value),
                "SharedAccessSignature" => sas = Some(value),
                "AccountName" => account = Some(value),
                "EndpointSuffix" => suffix = value,
                "DefaultEndpointsProtocol" => protocol = value,
                _ => {}
            }
        }

        let endpoint = match (blob_endpoint, account) {
            (Some(endpoint), _) => endpoint,
            (None, Some(account)) => format!("{}://{}.blob.{}", protocol, account, suffix),
            (None, None) => {
                return Err(StoreError::ConfigurationMissing(
                    "BlobEndpoint or AccountName".to_string(),
                ));
            }
        };

        let sas = sas.filter(|s| !s.is_empty()).ok_or_else(|| {
            StoreError::ConfigurationMissing(
                "SharedAccessSignature (account key signing is not supported)".to_string(),
            )
        })?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            sas: sas.trim_start_matches('?').to_string(),
        })
    }
}

/// Stores each page as `page_<i>_<ts>.json` plus one `index_<ts>.json`
/// in a blob container
pub struct BlobStore {
    http: reqwest::Client,
    connection: BlobConnection,
    container: String,
}

impl BlobStore {
    pub fn new(connection: BlobConnection, container: &str) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            http,
            connection,
            container: container.to_string(),
        })
    }

    fn page_blob(index: usize, ts: i64) -> String {
        format!("page_{}_{}.json", index, ts)
    }

    fn index_blob(ts: i64) -> String {
        format!("{}{}.json", INDEX_PREFIX, ts)
    }

    /// URL of the container (`blob = None`) or of one blob, with `params`
    /// and the SAS token as query
    fn url(&self, blob: Option<&str>, params: &[(&str, &str)]) -> String {
        let mut url = format!("{}/{}", self.connection.endpoint, self.container);
        if let Some(name) = blob {
            url.push('/');
            url.push_str(name);
        }

        let mut query = params
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    k,
                    url::form_urlencoded::byte_serialize(v.as_bytes()).collect::<String>()
                )
            })
            .collect::<Vec<_>>();
        query.push(self.connection.sas.clone());

        url.push('?');
        url.push_str(&query.join("&"));
        url
    }

    async fn container_exists(&self) -> Result<bool, StoreError> {
        let response = self
            .http
            .get(self.url(None, &[("restype", "container")]))
            .header("x-ms-version", API_VERSION)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(StoreError::Status {
                operation: "Container lookup".to_string(),
                status: status.as_u16(),
            }),
        }
    }

    async fn ensure_container(&self) -> Result<(), StoreError> {
        if self.container_exists().await? {
            return Ok(());
        }

        ::log::info!("Creating container: {}", self.container);
        let response = self
            .http
            .put(self.url(None, &[("restype", "container")]))
            .header("x-ms-version", API_VERSION)
            .header("Content-Length", "0")
            .send()
            .await?;

        match response.status() {
            status if status.is_success() || status == StatusCode::CONFLICT => Ok(()),
            status => Err(StoreError::Status {
                operation: "Container creation".to_string(),
                status: status.as_u16(),
            }),
        }
    }

    async fn upload(&self, name: &str, body: Vec<u8>) -> Result<(), StoreError> {
        ::log::info!("Uploading blob: {}", name);
        let response = self
            .http
            .put(self.url(Some(name), &[]))
            .header("x-ms-version", API_VERSION)
            .header("x-ms-blob-type", "BlockBlob")
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Status {
                operation: format!("Upload of {}", name),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    async fn download(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let response = self
            .http
            .get(self.url(Some(name), &[]))
            .header("x-ms-version", API_VERSION)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Status {
                operation: format!("Download of {}", name),
                status: response.status().as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Names of all blobs starting with `prefix`, following continuation markers
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut params = vec![("restype", "container"), ("comp", "list"), ("prefix", prefix)];
            if let Some(marker) = marker.as_deref() {
                params.push(("marker", marker));
            }

            let response = self
                .http
                .get(self.url(None, &params))
                .header("x-ms-version", API_VERSION)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(StoreError::Status {
                    operation: "Blob listing".to_string(),
                    status: response.status().as_u16(),
                });
            }

            let body = response.text().await?;
            let (page, next) = parse_listing(&body)?;
            names.extend(page);

            match next {
                Some(next) => marker = Some(next),
                None => break,
            }
        }

        Ok(names)
    }
}

/// Blob names and continuation marker of one `List Blobs` response.
///
/// Only `Name` elements directly under a `Blob` count; text is unescaped.
/// An empty `NextMarker` means the listing is complete.
pub fn parse_listing(xml: &str) -> Result<(Vec<String>, Option<String>), StoreError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut names = Vec::new();
    let mut marker = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).to_string());
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| StoreError::Listing(e.to_string()))?;
                match path.as_slice() {
                    [.., parent, leaf] if parent == "Blob" && leaf == "Name" => {
                        names.push(text.into_owned());
                    }
                    [.., leaf] if leaf == "NextMarker" && !text.is_empty() => {
                        marker = Some(text.into_owned());
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(StoreError::Listing(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok((names, marker))
}

#[async_trait]
impl ContentStore for BlobStore {
    fn backend(&self) -> &'static str {
        "blob"
    }

    async fn save_at(
        &self,
        records: &[PageRecord],
        scraped_at: DateTime<Utc>,
    ) -> Result<CrawlIndex, StoreError> {
        ::log::info!("Connecting to blob storage...");
        self.ensure_container().await?;

        let ts = scraped_at.timestamp_millis();
        for (i, page) in records.iter().enumerate() {
            self.upload(&Self::page_blob(i, ts), serde_json::to_vec(page)?)
                .await?;
        }

        let index = CrawlIndex::from_records(records, scraped_at);
        self.upload(&Self::index_blob(ts), serde_json::to_vec(&index)?)
            .await?;

        ::log::info!("All content saved to blob storage");
        Ok(index)
    }

    async fn try_load_latest(&self) -> Result<Vec<PageRecord>, StoreError> {
        ::log::info!("Retrieving content from blob storage...");

        if !self.container_exists().await? {
            ::log::info!("No scraped content found in blob storage");
            return Ok(Vec::new());
        }

        let latest = self
            .list(INDEX_PREFIX)
            .await?
            .iter()
            .filter_map(|name| timestamp_from_key(name, INDEX_PREFIX))
            .max();
        let Some(ts) = latest else {
            ::log::info!("No index file found in blob storage");
            return Ok(Vec::new());
        };

        let index: CrawlIndex = serde_json::from_slice(&self.download(&Self::index_blob(ts)).await?)?;

        let mut pages = Vec::with_capacity(index.page_count);
        for i in 0..index.page_count {
            let bytes = self.download(&Self::page_blob(i, ts)).await?;
            pages.push(serde_json::from_slice(&bytes)?);
        }

        Ok(pages)
    }
}
