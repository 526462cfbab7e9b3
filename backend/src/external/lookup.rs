//! External category/unit lookup client
//!
//! Optional integration with a hosted lookup service that maintains curated
//! category and unit mappings. When the service is not configured the
//! client is simply absent and callers fall back to the built-in heuristic.

use reqwest::Client;
use serde::Deserialize;

use crate::config::LookupConfig;
use crate::error::{AppError, AppResult};
use shared::UnitRule;

/// Lookup service client
#[derive(Clone)]
pub struct LookupClient {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Unit suggestion payload returned by the lookup service
#[derive(Debug, Deserialize)]
struct UnitsResponse {
    base_unit: String,
    #[serde(default)]
    purchase_unit: Option<String>,
}

/// Category listing payload returned by the lookup service
#[derive(Debug, Deserialize)]
struct CategoriesResponse {
    categories: Vec<String>,
}

impl LookupClient {
    /// Build a client when credentials are configured, `None` otherwise
    pub fn from_config(config: Option<&LookupConfig>) -> Option<Self> {
        let config = config?;
        if config.endpoint.trim().is_empty() || config.api_key.trim().is_empty() {
            return None;
        }
        Some(Self {
            client: Client::new(),
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Ask the lookup service for a unit suggestion for an item name.
    ///
    /// Returns `Ok(None)` when the service has no opinion.
    pub async fn suggest_units(&self, name: &str) -> AppResult<Option<UnitRule>> {
        let response = self
            .client
            .get(format!("{}/units", self.base_url))
            .query(&[("name", name)])
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "lookup service returned {}",
                response.status()
            )));
        }

        let payload: UnitsResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(e.to_string()))?;

        Ok(Some(UnitRule {
            base_unit: payload.base_unit,
            purchase_unit: payload.purchase_unit,
        }))
    }

    /// Fetch the curated category list
    pub async fn list_categories(&self) -> AppResult<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/categories", self.base_url))
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "lookup service returned {}",
                response.status()
            )));
        }

        let payload: CategoriesResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(e.to_string()))?;

        Ok(payload.categories)
    }
}
