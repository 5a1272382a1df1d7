// Reddit HTTP client — app-only OAuth over reqwest.
//
// Uses the client-credentials grant: the app's id/secret are exchanged for a
// bearer token, which every read endpoint on oauth.reddit.com accepts. The
// token is cached in-process and refreshed shortly before it expires, so one
// client instance serves an entire session without re-authenticating.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::Config;

/// Token endpoint for the client-credentials grant (unauthenticated host).
pub const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Base URL for all authenticated read endpoints.
pub const API_BASE_URL: &str = "https://oauth.reddit.com";

/// Refresh the bearer token when it has less than this long left to live.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

struct BearerToken {
    access_token: String,
    expires_at: Instant,
}

/// Thin reqwest wrapper for the Reddit read API.
///
/// Holds the HTTP client, the app credentials, and the cached bearer token.
/// All methods take `&self`; the token cache uses a tokio Mutex because
/// refreshing it requires an await.
pub struct RedditClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<BearerToken>>,
}

impl RedditClient {
    /// Build a client from the loaded configuration.
    ///
    /// Call `config.require_reddit()` first — an empty id/secret won't fail
    /// here, only once the token exchange is attempted.
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.reddit_user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            client_id: config.reddit_client_id.clone(),
            client_secret: config.reddit_client_secret.clone(),
            token: Mutex::new(None),
        })
    }

    /// Return a valid bearer token, exchanging credentials for a fresh one
    /// when none is cached or the cached one is about to expire.
    async fn bearer_token(&self) -> Result<String> {
        let mut slot = self.token.lock().await;

        if let Some(token) = slot.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                return Ok(token.access_token.clone());
            }
        }

        debug!("Requesting new Reddit access token");

        let response = self
            .client
            .post(TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("Reddit token request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!(
                "Reddit token endpoint returned {status} — check REDDIT_CLIENT_ID / REDDIT_CLIENT_SECRET"
            );
        }

        let grant: TokenResponse = response
            .json()
            .await
            .context("Failed to deserialize Reddit token response")?;

        let access_token = grant.access_token.clone();
        *slot = Some(BearerToken {
            access_token: grant.access_token,
            expires_at: Instant::now() + Duration::from_secs(grant.expires_in),
        });

        Ok(access_token)
    }

    /// Make a GET request to a Reddit API path and deserialize the response.
    ///
    /// `path` starts with a slash (e.g. "/r/rust/hot"); `params` are query
    /// string key-value pairs.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let token = self.bearer_token().await?;
        let url = format!("{API_BASE_URL}{path}");

        debug!(path = path, "Reddit API GET request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .query(params)
            .send()
            .await
            .with_context(|| format!("Reddit request failed: {path}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Reddit API {path} returned {status}: {body}");
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to deserialize {path} response"))
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}
