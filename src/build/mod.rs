//! Client for the site build service.
//!
//! `POST /builds` forwards to a separately deployed service that rebuilds
//! the static site. Calls carry a Google identity token whose audience is
//! the build endpoint.

use reqwest::Client;

use crate::config::Config;

const METADATA_IDENTITY_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/identity";

/// Errors raised while triggering a build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("build service endpoint is not configured")]
    NotConfigured,
    #[error("build service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("build service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to obtain identity token: {0}")]
    Credentials(String),
}

/// Where the identity token for each call comes from.
#[derive(Debug, Clone)]
enum IdentityTokenSource {
    Fixed(String),
    /// Fetched from the GCE metadata server on every call.
    MetadataServer,
}

pub struct BuildService {
    client: Client,
    endpoint: String,
    token_source: IdentityTokenSource,
}

impl BuildService {
    pub fn new(config: &Config) -> Result<Self, BuildError> {
        let client = Client::builder().timeout(config.store_timeout).build()?;
        let token_source = match &config.build_identity_token {
            Some(token) => IdentityTokenSource::Fixed(token.clone()),
            None => IdentityTokenSource::MetadataServer,
        };

        Ok(Self {
            client,
            endpoint: config.build_service_endpoint.clone(),
            token_source,
        })
    }

    /// Start a build and return the service's JSON reply unchanged.
    pub async fn trigger(&self) -> Result<serde_json::Value, BuildError> {
        if self.endpoint.is_empty() {
            return Err(BuildError::NotConfigured);
        }

        let token = self.identity_token().await?;
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BuildError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    async fn identity_token(&self) -> Result<String, BuildError> {
        match &self.token_source {
            IdentityTokenSource::Fixed(token) => Ok(token.clone()),
            IdentityTokenSource::MetadataServer => {
                let response = self
                    .client
                    .get(METADATA_IDENTITY_URL)
                    .query(&[("audience", self.endpoint.as_str())])
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await
                    .map_err(|e| BuildError::Credentials(e.to_string()))?;
                if !response.status().is_success() {
                    return Err(BuildError::Credentials(format!(
                        "metadata server returned {}",
                        response.status()
                    )));
                }
                response
                    .text()
                    .await
                    .map_err(|e| BuildError::Credentials(e.to_string()))
            }
        }
    }
}
