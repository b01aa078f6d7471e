use super::{GenerationParams, GenerationRequest, InferenceClient, InferenceError};
use crate::config::InferenceConfig;
use crate::health::{HealthCheckResult, HealthChecker};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// HTTP client for the hosted generation API.
#[derive(Clone)]
pub struct HttpInferenceClient {
    client: Client,
    config: InferenceConfig,
}

#[derive(Serialize)]
struct GenerationPayload<'a> {
    prompt: &'a str,
    #[serde(flatten)]
    params: &'a GenerationParams,
}

#[derive(Deserialize)]
struct GenerationResponse {
    url: Option<String>,
}

impl HttpInferenceClient {
    pub fn new(config: InferenceConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint_url(&self, request: &GenerationRequest) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            request.kind.endpoint_path()
        )
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, InferenceError> {
        let url = self.endpoint_url(&request);
        let payload = GenerationPayload {
            prompt: &request.prompt,
            params: &request.params,
        };

        tracing::debug!(kind = %request.kind, url = %url, "calling inference service");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| InferenceError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status(status.as_u16(), body));
        }

        let result: GenerationResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::Request(format!("invalid response body: {e}")))?;

        match result.url {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(InferenceError::EmptyResult),
        }
    }
}

#[async_trait]
impl HealthChecker for HttpInferenceClient {
    fn name(&self) -> &str {
        "inference"
    }

    /// Configuration-level check; no request is sent to the service.
    async fn check(&self) -> HealthCheckResult {
        if url::Url::parse(&self.config.base_url).is_err() {
            return HealthCheckResult::unhealthy_with_details(
                "Invalid inference base URL".to_string(),
                serde_json::json!({ "base_url": self.config.base_url }),
            );
        }

        if self.config.api_key.is_empty() {
            return HealthCheckResult::degraded("Inference API key not configured".to_string());
        }

        HealthCheckResult::healthy_with_details(serde_json::json!({
            "base_url": self.config.base_url,
        }))
    }
}
