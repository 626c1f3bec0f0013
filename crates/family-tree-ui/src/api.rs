//! API client for backend communication

use family_tree_core::FetchError;
use family_tree_types::{PersonDetail, PersonId, PersonRecord, TreeLayoutResponse};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a server path such as a photo reference
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, String> {
        let url = self.resolve(path);

        let response = self.client.get(&url).send().await.map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {}: {}", status, text));
        }

        response.json::<T>().await.map_err(|e| e.to_string())
    }

    /// Person rows of the whole tree, taken from the flat layout endpoint.
    pub async fn tree_records(&self) -> Result<Vec<PersonRecord>, String> {
        let layout: TreeLayoutResponse = self.get("/api/tree/layout").await?;
        Ok(layout.nodes.iter().map(|n| n.to_record()).collect())
    }

    /// Detail for the side panel. A 404 is reported as `NotFound`.
    pub async fn person(&self, id: PersonId) -> Result<PersonDetail, FetchError> {
        let url = self.resolve(&format!("/api/person/{id}"));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transient(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(FetchError::NotFound(id)),
            status if !status.is_success() => Err(FetchError::Transient(format!("HTTP {status}"))),
            _ => response
                .json::<PersonDetail>()
                .await
                .map_err(|e| FetchError::Transient(e.to_string())),
        }
    }
}
