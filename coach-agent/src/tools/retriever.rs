//! Semantic search over the fitness knowledge base in Pinecone.
//!
//! The index uses integrated embeddings, so queries are sent as text and
//! Pinecone embeds them server-side.

use super::Tool;
use crate::config::RetrieverConfig;
use crate::error::ToolError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use service_core::observability::TracedClientExt;
use std::time::Duration;

pub const PINECONE_CONTROL_URL: &str = "https://api.pinecone.io";
const PINECONE_API_VERSION: &str = "2025-01";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const SEARCH_FIELDS: [&str; 2] = ["category", "original_text"];
const CITATION_HINT: &str = "Include the <url> as a reference when quoting content.";

#[derive(Debug, Clone, Deserialize)]
pub struct IndexDescription {
    pub name: String,
    #[serde(default)]
    pub host: String,
}

#[derive(Debug, Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexDescription>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateIndexRequest {
    pub name: String,
    pub dimension: u32,
    pub metric: String,
    pub spec: IndexSpec,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexSpec {
    pub serverless: ServerlessSpec,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerlessSpec {
    pub cloud: String,
    pub region: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub query: SearchQuery,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchQuery {
    pub inputs: SearchInputs,
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchInputs {
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub result: SearchResult,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub hits: Vec<Hit>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Hit {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "_score", default)]
    pub score: f64,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Minimal Pinecone REST client covering index management and records search.
#[derive(Clone)]
pub struct PineconeClient {
    api_key: String,
    control_url: String,
    http: Client,
}

impl PineconeClient {
    pub fn new(api_key: &str) -> Result<Self, ToolError> {
        Self::with_control_url(api_key, PINECONE_CONTROL_URL)
    }

    pub fn with_control_url(api_key: &str, control_url: &str) -> Result<Self, ToolError> {
        if api_key.trim().is_empty() {
            return Err(ToolError::NotConfigured(
                "Pinecone API key is empty".to_string(),
            ));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ToolError::Search(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: api_key.to_string(),
            control_url: control_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub async fn list_indexes(&self) -> Result<Vec<IndexDescription>, ToolError> {
        let url = format!("{}/indexes", self.control_url);
        let response = self
            .http
            .traced_get(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
            .send()
            .await
            .map_err(network_error)?;
        let list: IndexList = read_json(response).await?;
        Ok(list.indexes)
    }

    pub async fn create_index(&self, request: &CreateIndexRequest) -> Result<(), ToolError> {
        let url = format!("{}/indexes", self.control_url);
        let response = self
            .http
            .traced_post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
            .json(request)
            .send()
            .await
            .map_err(network_error)?;
        let _: Value = read_json(response).await?;
        tracing::info!(index = %request.name, "Created Pinecone index");
        Ok(())
    }

    pub async fn describe_index(&self, name: &str) -> Result<IndexDescription, ToolError> {
        let url = format!("{}/indexes/{}", self.control_url, name);
        let response = self
            .http
            .traced_get(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
            .send()
            .await
            .map_err(network_error)?;
        read_json(response).await
    }

    #[tracing::instrument(skip(self, request), fields(top_k = request.query.top_k))]
    pub async fn search_records(
        &self,
        host: &str,
        namespace: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, ToolError> {
        let url = search_url(host, namespace)?;
        let response = self
            .http
            .traced_post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
            .json(request)
            .send()
            .await
            .map_err(network_error)?;
        read_json(response).await
    }
}

fn network_error(e: reqwest::Error) -> ToolError {
    tracing::error!(error = %e, "Pinecone request failed");
    ToolError::Search(e.to_string())
}

async fn read_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T, ToolError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ToolError::Search(e.to_string()))?;

    if !status.is_success() {
        return Err(ToolError::Search(format!(
            "Pinecone API error {}: {}",
            status,
            body.chars().take(500).collect::<String>()
        )));
    }

    serde_json::from_str(&body)
        .map_err(|e| ToolError::Search(format!("Failed to parse Pinecone response: {}", e)))
}

/// Index hosts come back without a scheme.
fn data_plane_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

/// Record search endpoint for a namespace. The namespace is a single
/// percent-encoded path segment.
fn search_url(host: &str, namespace: &str) -> Result<String, ToolError> {
    let mut url = reqwest::Url::parse(&data_plane_url(host))
        .map_err(|e| ToolError::Search(format!("Invalid index host '{}': {}", host, e)))?;
    url.path_segments_mut()
        .map_err(|_| ToolError::Search(format!("Invalid index host '{}'", host)))?
        .pop_if_empty()
        .extend(["records", "namespaces", namespace, "search"]);
    Ok(url.into())
}

/// Derives a source URL and title from ids shaped like
/// `url_<address>_chunk_<n>`.
pub fn source_of(id: &str) -> (String, String) {
    let mut url = "No URL".to_string();
    let mut title = "Untitled".to_string();

    if id.starts_with("url_") {
        let head = id.split("_chunk_").next().unwrap_or_default();
        let address = head.replace("url_", "");
        if !address.is_empty() {
            let last = address.rsplit('/').next().unwrap_or_default();
            title = super::title_case(&last.replace(".html", "").replace('-', " "));
            url = address;
        }
    }
    (url, title)
}

pub fn format_hits(hits: &[Hit]) -> String {
    let documents: Vec<String> = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            let (url, title) = source_of(&hit.id);
            let content = hit
                .fields
                .get("original_text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim();
            format!(
                "\n<document id=\"{}\">\n<title>{}</title>\n<url>{}</url>\n<content>{}</content>\n<score>{:.4}</score>\n</document>\n",
                i + 1,
                title,
                url,
                content,
                hit.score
            )
        })
        .collect();

    format!(
        "<search_results>\n{}\n</search_results>\n{}",
        documents.join("\n"),
        CITATION_HINT
    )
}

/// The query arrives as a JSON string `{"query": "..."}`; a bare string or an
/// already-decoded object is accepted too.
fn extract_query(args: &Value) -> Result<String, ToolError> {
    let from_object = |o: &Map<String, Value>| {
        o.get("query")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ToolError::invalid_arguments(NAME, "missing 'query' field"))
    };

    match args.get("query") {
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(o)) => from_object(&o),
            _ => Ok(raw.clone()),
        },
        Some(Value::Object(o)) => from_object(o),
        _ => Err(ToolError::invalid_arguments(NAME, "'query' must be a string")),
    }
}

const NAME: &str = "pinecone_vector_search_retriever";

pub struct PineconeRetrieverTool {
    client: PineconeClient,
    index_name: String,
    host: String,
    namespace: String,
    top_k: usize,
}

impl PineconeRetrieverTool {
    /// Ensures the index exists, creating it from the serverless settings when it
    /// does not, then resolves its data-plane host.
    pub async fn connect(config: &RetrieverConfig) -> Result<Self, ToolError> {
        let api_key = config
            .pinecone_api_key
            .as_deref()
            .ok_or_else(|| ToolError::NotConfigured("PINECONE_API_KEY is not set".to_string()))?;
        Self::connect_with(PineconeClient::new(api_key)?, config).await
    }

    pub async fn connect_with(client: PineconeClient, config: &RetrieverConfig) -> Result<Self, ToolError> {
        let index_name = config.index_name().to_string();
        if index_name.is_empty() {
            return Err(ToolError::NotConfigured(
                "pinecone_index_name is not set".to_string(),
            ));
        }

        let existing = client.list_indexes().await?;
        if !existing.iter().any(|i| i.name == index_name) {
            let dimension = config.dimension.ok_or_else(|| {
                ToolError::NotConfigured(format!(
                    "index '{}' does not exist and no dimension is configured to create it",
                    index_name
                ))
            })?;
            client
                .create_index(&CreateIndexRequest {
                    name: index_name.clone(),
                    dimension,
                    metric: config.metric.clone(),
                    spec: IndexSpec {
                        serverless: ServerlessSpec {
                            cloud: config.cloud.clone(),
                            region: config.region.clone(),
                        },
                    },
                })
                .await?;
        }

        let description = client.describe_index(&index_name).await?;
        if description.host.is_empty() {
            return Err(ToolError::Search(format!(
                "index '{}' has no host yet",
                index_name
            )));
        }

        tracing::info!(
            index = %index_name,
            host = %description.host,
            namespace = %config.pinecone_namespace,
            top_k = config.k,
            "Connected to Pinecone index"
        );

        Ok(Self {
            client,
            index_name,
            host: description.host,
            namespace: config.pinecone_namespace.clone(),
            top_k: config.k,
        })
    }
}

#[async_trait]
impl Tool for PineconeRetrieverTool {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Use this tool to search and retrieve relevant documents from a Pinecone vector \
         database using semantic search."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "JSON string with a \"query\" field containing the user's search query."
                }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, args: Value) -> Result<String, ToolError> {
        let query = extract_query(&args)?;
        tracing::info!(
            index = %self.index_name,
            namespace = %self.namespace,
            top_k = self.top_k,
            "Searching knowledge base"
        );

        let request = SearchRequest {
            query: SearchQuery {
                inputs: SearchInputs { text: query },
                top_k: self.top_k,
            },
            fields: SEARCH_FIELDS.iter().map(|f| f.to_string()).collect(),
        };
        let response = self
            .client
            .search_records(&self.host, &self.namespace, &request)
            .await?;

        tracing::debug!(hits = response.result.hits.len(), "Search complete");
        Ok(format_hits(&response.result.hits))
    }
}
