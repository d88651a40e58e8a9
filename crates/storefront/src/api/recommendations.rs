//! Recommendation API client.

use std::sync::Arc;

use tracing::instrument;
use url::Url;

use super::types::{RecommendationRequest, RecommendationResponse};
use super::{ApiError, http_client, normalize_base, read_json};
use crate::config::ApiConfig;

/// Client for the recommendation service. Responses are never cached; they
/// depend on the shopper and change with every interaction.
#[derive(Clone)]
pub struct RecommendationClient {
    inner: Arc<RecommendationClientInner>,
}

struct RecommendationClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl RecommendationClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        Ok(Self {
            inner: Arc::new(RecommendationClientInner {
                client: http_client(config.request_timeout)?,
                base_url: normalize_base(config.ai_base_url.clone()),
            }),
        })
    }

    /// Request recommendations.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(limit = request.limit))]
    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse, ApiError> {
        let url = self.inner.base_url.join("recommendations")?;
        let response = self.inner.client.post(url).json(request).send().await?;
        let recommendations: RecommendationResponse = read_json(response).await?;

        tracing::debug!(
            strategy = %recommendations.strategy,
            count = recommendations.recommendations.len(),
            "Received recommendations"
        );

        Ok(recommendations)
    }
}
