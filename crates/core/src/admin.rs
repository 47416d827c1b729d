//! Admin API: resource deletion
//!
//! Requests are built as plain [`DeleteRequest`] values first, then sent by
//! [`MediaClient`] with HTTP Basic credentials (API key / API secret).

use crate::client::MediaClient;
use crate::error::{Error, Result};
use crate::options::DeleteOptions;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of identifiers accepted by a single delete call
pub const MAX_IDS_PER_REQUEST: usize = 100;

/// A DELETE call against the admin API, relative to the cloud endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl DeleteRequest {
    fn new(path: String) -> Self {
        Self {
            path,
            query: Vec::new(),
        }
    }

    fn push(&mut self, key: &str, value: impl Into<String>) {
        self.query.push((key.to_string(), value.into()));
    }

    /// All values for a query key, in order
    pub fn values(&self, key: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Delete the given public IDs (up to 100)
    pub fn resources(public_ids: &[String], options: &DeleteOptions) -> Result<Self> {
        check_ids("public_ids", public_ids)?;

        let mut request = Self::new(resources_path(options));
        for id in public_ids {
            request.push("public_ids[]", id.as_str());
        }
        request.push_common(options);
        Ok(request)
    }

    /// Delete every resource whose public ID starts with `prefix`
    pub fn by_prefix(prefix: &str, options: &DeleteOptions) -> Result<Self> {
        if prefix.trim().is_empty() {
            return Err(Error::InvalidInput("prefix cannot be empty".to_string()));
        }

        let mut request = Self::new(resources_path(options));
        request.push("prefix", prefix);
        request.push_common(options);
        Ok(request)
    }

    /// Delete every resource of the resource/storage type
    pub fn all(options: &DeleteOptions) -> Self {
        let mut request = Self::new(resources_path(options));
        request.push("all", "true");
        request.push_common(options);
        request
    }

    /// Delete every resource carrying `tag`
    pub fn by_tag(tag: &str, options: &DeleteOptions) -> Result<Self> {
        if tag.trim().is_empty() {
            return Err(Error::InvalidInput("tag cannot be empty".to_string()));
        }

        let mut request = Self::new(format!(
            "resources/{}/tags/{}",
            options.resource_type(),
            path_segment(tag)?
        ));
        request.push_common(options);
        Ok(request)
    }

    /// Delete derived assets by their derived resource IDs
    pub fn derived(derived_resource_ids: &[String]) -> Result<Self> {
        check_ids("derived_resource_ids", derived_resource_ids)?;

        let mut request = Self::new("derived_resources".to_string());
        for id in derived_resource_ids {
            request.push("derived_resource_ids[]", id.as_str());
        }
        Ok(request)
    }

    /// Delete the derivatives produced by `transformations` for the given
    /// public IDs. Originals are always kept.
    pub fn derived_by_transformation(
        public_ids: &[String],
        transformations: &[String],
        options: &DeleteOptions,
    ) -> Result<Self> {
        check_ids("public_ids", public_ids)?;
        if transformations.iter().all(|t| t.trim().is_empty()) {
            return Err(Error::InvalidInput(
                "at least one transformation is required".to_string(),
            ));
        }

        let options = options.clone().with_keep_original(true);
        let mut request = Self::new(resources_path(&options));
        for id in public_ids {
            request.push("public_ids[]", id.as_str());
        }
        let joined = transformations
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("|");
        request.push("transformations", joined);
        request.push_common(&options);
        Ok(request)
    }

    fn push_common(&mut self, options: &DeleteOptions) {
        if options.keep_original() {
            self.push("keep_original", "true");
        }
        if let Some(invalidate) = options.invalidate {
            self.push("invalidate", invalidate.to_string());
        }
        if let Some(cursor) = &options.next_cursor {
            self.push("next_cursor", cursor.as_str());
        }
    }
}

fn resources_path(options: &DeleteOptions) -> String {
    format!(
        "resources/{}/{}",
        options.resource_type(),
        options.storage_type()
    )
}

/// Percent-encode a value as one path segment, so `/`, `?` and `#` stay inside it
fn path_segment(value: &str) -> Result<String> {
    if value == "." || value == ".." {
        return Err(Error::InvalidInput(format!(
            "'{}' cannot be used as a path segment",
            value
        )));
    }

    let mut url = reqwest::Url::parse("http://localhost/")
        .map_err(|e| Error::HttpClient(format!("failed to build path: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| Error::HttpClient("failed to build path".to_string()))?
        .pop_if_empty()
        .push(value);

    Ok(url.path().trim_start_matches('/').to_string())
}

fn check_ids(name: &str, ids: &[String]) -> Result<()> {
    if ids.is_empty() || ids.iter().any(|id| id.trim().is_empty()) {
        return Err(Error::InvalidInput(format!(
            "{} must contain at least one non-empty id",
            name
        )));
    }
    if ids.len() > MAX_IDS_PER_REQUEST {
        return Err(Error::InvalidInput(format!(
            "{} accepts at most {} ids per request (got {})",
            name,
            MAX_IDS_PER_REQUEST,
            ids.len()
        )));
    }
    Ok(())
}

/// Answer of the delete endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminResponse {
    /// Public ID (or derived ID) to status, e.g. `"deleted"` or `"not_found"`
    pub deleted: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_counts: Option<Value>,
    pub partial: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl AdminResponse {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// `(id, status)` pairs from the `deleted` map, ordered by id
    pub fn statuses(&self) -> Vec<(String, String)> {
        let mut statuses: Vec<(String, String)> = self
            .deleted
            .as_object()
            .map(|map| {
                map.iter()
                    .map(|(id, status)| {
                        let status = status
                            .as_str()
                            .map(str::to_string)
                            .unwrap_or_else(|| status.to_string());
                        (id.clone(), status)
                    })
                    .collect()
            })
            .unwrap_or_default();
        statuses.sort();
        statuses
    }
}

impl MediaClient {
    /// Delete resources by public ID (at most 100 per call)
    pub async fn delete_resources(
        &self,
        public_ids: &[String],
        options: DeleteOptions,
    ) -> Result<AdminResponse> {
        let request = DeleteRequest::resources(public_ids, &options)?;
        self.send_delete(request).await
    }

    /// Delete resources whose public ID starts with `prefix`
    pub async fn delete_resources_by_prefix(
        &self,
        prefix: &str,
        options: DeleteOptions,
    ) -> Result<AdminResponse> {
        let request = DeleteRequest::by_prefix(prefix, &options)?;
        self.send_delete(request).await
    }

    /// Delete every resource of a resource/storage type. Large accounts answer
    /// with `partial: true` and a `next_cursor` to continue with.
    pub async fn delete_all_resources(&self, options: DeleteOptions) -> Result<AdminResponse> {
        self.send_delete(DeleteRequest::all(&options)).await
    }

    /// Delete resources carrying `tag`
    pub async fn delete_resources_by_tag(
        &self,
        tag: &str,
        options: DeleteOptions,
    ) -> Result<AdminResponse> {
        let request = DeleteRequest::by_tag(tag, &options)?;
        self.send_delete(request).await
    }

    /// Delete derived assets
    pub async fn delete_derived_resources(
        &self,
        derived_resource_ids: &[String],
    ) -> Result<AdminResponse> {
        let request = DeleteRequest::derived(derived_resource_ids)?;
        self.send_delete(request).await
    }

    /// Delete derivatives of `public_ids` produced by `transformations`
    pub async fn delete_derived_by_transformation(
        &self,
        public_ids: &[String],
        transformations: &[String],
        options: DeleteOptions,
    ) -> Result<AdminResponse> {
        let request =
            DeleteRequest::derived_by_transformation(public_ids, transformations, &options)?;
        self.send_delete(request).await
    }

    async fn send_delete(&self, request: DeleteRequest) -> Result<AdminResponse> {
        let url = self.endpoint(&request.path);
        tracing::debug!(url = %url, params = request.query.len(), "sending admin delete request");

        let response = self
            .http_client()
            .delete(&url)
            .basic_auth(self.api_key(), Some(self.api_secret()))
            .query(&request.query)
            .send()
            .await?;

        let answer: AdminResponse = self.handle_response(response).await?;
        if answer.partial {
            tracing::info!(
                next_cursor = answer.next_cursor.as_deref().unwrap_or(""),
                "partial deletion, call again with the cursor to continue"
            );
        }
        Ok(answer)
    }
}
