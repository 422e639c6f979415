use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use foundation::ids::ViewId;
use formats::{FormatError, ViewDocument, ViewSummary};
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::ConfigFetchError;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Source of view documents.
///
/// Implementations must be `Send + Sync`; methods return boxed futures for
/// dyn-compatibility.
pub trait ViewProvider: Send + Sync {
    /// `GET /views`
    fn list_views(&self) -> BoxFuture<'_, Result<BTreeMap<ViewId, ViewSummary>, ConfigFetchError>>;

    /// `GET /views/{id}`
    fn get_view<'a>(
        &'a self,
        id: &'a ViewId,
    ) -> BoxFuture<'a, Result<ViewDocument, ConfigFetchError>>;
}

/// View provider reached over HTTP at `{base}/views`.
pub struct HttpViewProvider {
    base_url: String,
    client: reqwest::Client,
}

impl HttpViewProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn views_url(&self) -> String {
        format!("{}/views", self.base_url)
    }

    async fn get_json(&self, url: String) -> Result<Option<Value>, ConfigFetchError> {
        let resp = self.client.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(ConfigFetchError::Status {
                status: resp.status().as_u16(),
                url,
            });
        }
        let text = resp.text().await?;
        let value = serde_json::from_str(&text).map_err(FormatError::from)?;
        Ok(Some(value))
    }
}

impl ViewProvider for HttpViewProvider {
    fn list_views(&self) -> BoxFuture<'_, Result<BTreeMap<ViewId, ViewSummary>, ConfigFetchError>> {
        Box::pin(async move {
            let url = self.views_url();
            let Some(value) = self.get_json(url.clone()).await? else {
                return Err(ConfigFetchError::Status { status: 404, url });
            };
            let views = serde_json::from_value(value).map_err(FormatError::from)?;
            Ok(views)
        })
    }

    fn get_view<'a>(
        &'a self,
        id: &'a ViewId,
    ) -> BoxFuture<'a, Result<ViewDocument, ConfigFetchError>> {
        Box::pin(async move {
            let url = format!("{}/{}", self.views_url(), id);
            let Some(value) = self.get_json(url).await? else {
                return Err(ConfigFetchError::NotFound(id.clone()));
            };
            let doc = serde_json::from_value(value).map_err(FormatError::from)?;
            Ok(doc)
        })
    }
}

/// View provider backed by raw JSON documents held in memory.
///
/// Documents are stored unparsed so that malformed ones surface the same way
/// they would over HTTP.
#[derive(Debug, Default)]
pub struct InMemoryViewProvider {
    documents: RwLock<BTreeMap<ViewId, Value>>,
    offline: RwLock<bool>,
}

impl InMemoryViewProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `config` as the `config` object of view `id`.
    pub fn insert(&self, id: impl Into<ViewId>, config: Value) {
        let id = id.into();
        let doc = serde_json::json!({ "id": id.as_str(), "config": config });
        self.documents.write().insert(id, doc);
    }

    /// Stores a complete document verbatim.
    pub fn insert_document(&self, id: impl Into<ViewId>, document: Value) {
        self.documents.write().insert(id.into(), document);
    }

    pub fn remove(&self, id: &ViewId) -> bool {
        self.documents.write().remove(id).is_some()
    }

    /// Simulates an unreachable provider.
    pub fn set_offline(&self, offline: bool) {
        *self.offline.write() = offline;
    }

    fn check_online(&self) -> Result<(), ConfigFetchError> {
        if *self.offline.read() {
            return Err(ConfigFetchError::Unreachable("provider offline".to_string()));
        }
        Ok(())
    }
}

impl ViewProvider for InMemoryViewProvider {
    fn list_views(&self) -> BoxFuture<'_, Result<BTreeMap<ViewId, ViewSummary>, ConfigFetchError>> {
        Box::pin(async move {
            self.check_online()?;
            let docs = self.documents.read();
            let mut out = BTreeMap::new();
            for (id, doc) in docs.iter() {
                let config = doc.get("config").cloned().unwrap_or(Value::Null);
                let summary: ViewSummary =
                    serde_json::from_value(config).map_err(FormatError::from)?;
                out.insert(id.clone(), summary);
            }
            Ok(out)
        })
    }

    fn get_view<'a>(
        &'a self,
        id: &'a ViewId,
    ) -> BoxFuture<'a, Result<ViewDocument, ConfigFetchError>> {
        Box::pin(async move {
            self.check_online()?;
            let Some(doc) = self.documents.read().get(id).cloned() else {
                return Err(ConfigFetchError::NotFound(id.clone()));
            };
            let doc = serde_json::from_value(doc).map_err(FormatError::from)?;
            Ok(doc)
        })
    }
}
