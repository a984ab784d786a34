use crate::{ClientError, ClientResult, PlatformApi, rison};

use bi_core::bundle::{first_uuid_of_kind, read_entries, write_bundle};
use bi_core::{Filter, ResourceKind};

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace};
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, Url};
use serde_json::{Value, json};

/// Page size requested from list endpoints
pub const PAGE_SIZE: u64 = 100;

/// Maximum ids per export request
pub const EXPORT_CHUNK_SIZE: usize = 100;

/// HTTP client for the platform REST API
pub struct Client {
    pub base_url: String,
    pub access_token: Option<String>,
    client: ReqwestClient,
}

impl Client {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - Platform URL (e.g., "http://localhost:8088")
    /// * `access_token` - Optional bearer token sent with every request
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: &str, access_token: Option<&str>, timeout: Duration) -> ClientResult<Self> {
        let client = ReqwestClient::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.map(String::from),
            client,
        })
    }

    fn url(&self, path: &str, query: Option<&Value>) -> ClientResult<Url> {
        let raw = format!("{}{}", self.base_url, path);
        let mut url = Url::parse(&raw).map_err(|e| ClientError::invalid_url(&raw, e.to_string()))?;
        if let Some(query) = query {
            url.query_pairs_mut().append_pair("q", &rison::encode(query));
        }
        Ok(url)
    }

    /// Build a request with the referer and optional bearer token
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        trace!("{method} {url}");
        let mut req = self
            .client
            .request(method, url)
            .header("Referer", &self.base_url);

        if let Some(ref token) = self.access_token {
            req = req.bearer_auth(token);
        }

        req
    }

    /// Send the request and turn non-success statuses into API errors
    async fn execute(&self, req: RequestBuilder) -> ClientResult<Response> {
        let response = req.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let mut messages = error_messages(&body);
        if messages.is_empty() {
            messages.push(
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
            );
        }
        Err(ClientError::api_error(status.as_u16(), messages))
    }

    async fn execute_json(&self, req: RequestBuilder) -> ClientResult<Value> {
        let response = self.execute(req).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn export_chunk(&self, kind: ResourceKind, ids: &[i64]) -> ClientResult<Vec<u8>> {
        let url = self.url(&format!("/api/v1/{}/export/", kind.as_str()), Some(&json!(ids)))?;
        let response = self.execute(self.request(Method::GET, url)).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Collect human-readable messages from an error body.
///
/// The platform reports errors as `{"message": "..."}`, as
/// `{"message": {"field": ["..."]}}` for validation failures, or as
/// `{"errors": [{"message": "..."}]}`. Bodies that are not JSON are returned
/// verbatim.
pub(crate) fn error_messages(body: &str) -> Vec<String> {
    let Ok(payload) = serde_json::from_str::<Value>(body) else {
        let text = body.trim();
        return if text.is_empty() {
            Vec::new()
        } else {
            vec![text.to_string()]
        };
    };

    let mut messages = Vec::new();
    if let Some(errors) = payload.get("errors").and_then(Value::as_array) {
        for error in errors {
            match error.get("message") {
                Some(message) => flatten_message(None, message, &mut messages),
                None => flatten_message(None, error, &mut messages),
            }
        }
    }
    if let Some(message) = payload.get("message") {
        flatten_message(None, message, &mut messages);
    }
    messages
}

fn flatten_message(prefix: Option<&str>, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(text) => out.push(match prefix {
            Some(prefix) => format!("{prefix}: {text}"),
            None => text.clone(),
        }),
        Value::Array(items) => {
            for item in items {
                flatten_message(prefix, item, out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                flatten_message(Some(key), item, out);
            }
        }
        Value::Null => {}
        other => out.push(other.to_string()),
    }
}

#[async_trait]
impl PlatformApi for Client {
    async fn list_resources(
        &self,
        kind: ResourceKind,
        filters: &[Filter],
    ) -> ClientResult<Vec<Value>> {
        let filters: Vec<Value> = filters
            .iter()
            .map(|filter| {
                json!({
                    "col": filter.key,
                    "opr": filter.predicate.operator(),
                    "value": filter.predicate.value_json(),
                })
            })
            .collect();

        let mut resources = Vec::new();
        let mut page: u64 = 0;
        loop {
            let query = json!({
                "filters": filters,
                "order_column": "changed_on_delta_humanized",
                "order_direction": "desc",
                "page": page,
                "page_size": PAGE_SIZE,
            });
            let url = self.url(&format!("/api/v1/{}/", kind.as_str()), Some(&query))?;
            let mut body = self.execute_json(self.request(Method::GET, url)).await?;

            let batch = match body.get_mut("result").map(Value::take) {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(ClientError::unexpected(format!(
                        "{} listing has no result array",
                        kind
                    )));
                }
            };
            if batch.is_empty() {
                break;
            }
            resources.extend(batch);
            page += 1;
        }

        debug!("Listed {} {}", resources.len(), kind.plural());
        Ok(resources)
    }

    async fn export_bundle(&self, kind: ResourceKind, ids: &[i64]) -> ClientResult<Vec<u8>> {
        let mut entries = Vec::new();
        for chunk in ids.chunks(EXPORT_CHUNK_SIZE) {
            let bundle = self.export_chunk(kind, chunk).await?;
            entries.extend(read_entries(&bundle)?);
        }
        debug!(
            "Exported {} {} ({} files)",
            ids.len(),
            kind.plural(),
            entries.len()
        );
        Ok(write_bundle(entries)?)
    }

    async fn import_bundle(
        &self,
        kind: ResourceKind,
        bundle: Vec<u8>,
        overwrite: bool,
    ) -> ClientResult<bool> {
        let url = self.url(&format!("/api/v1/{}/import/", kind.as_str()), None)?;
        let part = Part::bytes(bundle)
            .file_name("bundle.zip")
            .mime_str("application/zip")?;
        let form = Form::new()
            .part("formData", part)
            .text("overwrite", overwrite.to_string());

        let req = self
            .request(Method::POST, url)
            .header("Accept", "application/json")
            .multipart(form);
        let body = self.execute_json(req).await?;

        Ok(body.get("message").and_then(Value::as_str) == Some("OK"))
    }

    async fn delete_resource(&self, kind: ResourceKind, id: i64) -> ClientResult<()> {
        let url = self.url(&format!("/api/v1/{}/{}", kind.as_str(), id), None)?;
        self.execute(self.request(Method::DELETE, url)).await?;
        debug!("Deleted {} {}", kind, id);
        Ok(())
    }

    async fn get_uuids_for_ids(
        &self,
        kind: ResourceKind,
        ids: &[i64],
    ) -> ClientResult<BTreeMap<i64, String>> {
        let mut uuids = BTreeMap::new();
        for &id in ids {
            let bundle = match self.export_chunk(kind, &[id]).await {
                Ok(bundle) => bundle,
                Err(ClientError::Api { status, .. }) => {
                    debug!("Export of {kind} {id} refused with status {status}");
                    continue;
                }
                Err(e) => return Err(e),
            };
            if let Some(uuid) = first_uuid_of_kind(&bundle, kind)? {
                uuids.insert(id, uuid);
            }
        }
        Ok(uuids)
    }
}
