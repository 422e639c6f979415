use foundation::ids::SourceId;
use formats::{ColumnMetadata, FeatureCollection, FormatError, RecordSet};
use serde_json::Value;
use tracing::debug;

use crate::provider::{BoxFuture, DataError, DataProvider, FilteredQuery};

/// Data provider reached over HTTP at `{base}/data`.
pub struct HttpDataProvider {
    base_url: String,
    client: reqwest::Client,
}

impl HttpDataProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    fn source_url(&self, source: &SourceId) -> String {
        format!("{}/data/{}", self.base_url, source)
    }

    async fn read_json(
        &self,
        source: &SourceId,
        url: String,
        resp: reqwest::Response,
    ) -> Result<Value, DataError> {
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::UnknownSource(source.clone()));
        }
        if !resp.status().is_success() {
            return Err(DataError::Status {
                status: resp.status().as_u16(),
                url,
            });
        }
        let text = resp.text().await?;
        debug!(source = %source, bytes = text.len(), "data payload received");
        Ok(serde_json::from_str(&text).map_err(FormatError::from)?)
    }
}

impl DataProvider for HttpDataProvider {
    fn columns<'a>(
        &'a self,
        source: &'a SourceId,
    ) -> BoxFuture<'a, Result<Vec<ColumnMetadata>, DataError>> {
        Box::pin(async move {
            let url = format!("{}/columns", self.source_url(source));
            let resp = self.client.get(&url).send().await?;
            let value = self.read_json(source, url, resp).await?;
            Ok(serde_json::from_value(value).map_err(FormatError::from)?)
        })
    }

    fn filtered<'a>(
        &'a self,
        source: &'a SourceId,
        query: &'a FilteredQuery,
    ) -> BoxFuture<'a, Result<FeatureCollection, DataError>> {
        Box::pin(async move {
            let url = format!("{}/filtered", self.source_url(source));
            let resp = self.client.post(&url).json(query).send().await?;
            let value = self.read_json(source, url, resp).await?;
            Ok(FeatureCollection::from_value(value)?)
        })
    }

    fn records<'a>(&'a self, source: &'a SourceId) -> BoxFuture<'a, Result<RecordSet, DataError>> {
        Box::pin(async move {
            let url = self.source_url(source);
            let resp = self.client.get(&url).send().await?;
            let value = self.read_json(source, url, resp).await?;
            Ok(RecordSet::from_value(value)?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::HttpDataProvider;
    use foundation::ids::SourceId;

    #[test]
    fn urls_follow_the_data_api() {
        let p = HttpDataProvider::new("http://127.0.0.1:5003/api/");
        assert_eq!(
            p.source_url(&SourceId::from("traffic_api")),
            "http://127.0.0.1:5003/api/data/traffic_api"
        );
    }
}
