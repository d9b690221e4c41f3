use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::app::{MemeflowError, Result};
use crate::domain::{rank_posts, Post};
use crate::provider::PostProvider;

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Reddit API credentials and fetch settings, bound from configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
    pub subreddit: String,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            username: String::new(),
            password: String::new(),
            user_agent: "memeflow/0.1.0".into(),
            subreddit: "memes".into(),
        }
    }
}

impl RedditConfig {
    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty()
            && !self.client_secret.is_empty()
            && !self.username.is_empty()
            && !self.password.is_empty()
    }
}

/// OAuth token with its expiry instant.
///
/// An explicit cache object owned by the provider; there is no process-wide
/// token state. The 60-second margin keeps a token from expiring between
/// the validity check and the request that uses it.
#[derive(Debug, Clone, Default)]
pub struct TokenCache {
    access_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl TokenCache {
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        match (&self.access_token, self.expires_at) {
            (Some(token), Some(expires_at)) if !token.is_empty() => {
                now < expires_at - chrono::Duration::seconds(60)
            }
            _ => false,
        }
    }

    pub fn store(&mut self, token: String, expires_at: DateTime<Utc>) {
        self.access_token = Some(token);
        self.expires_at = Some(expires_at);
    }

    fn token(&self) -> Option<String> {
        self.access_token.clone()
    }
}

pub struct RedditProvider {
    client: Client,
    config: RedditConfig,
    cache: Mutex<TokenCache>,
}

impl RedditProvider {
    pub fn new(config: RedditConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.clone())
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            config,
            cache: Mutex::new(TokenCache::default()),
        }
    }

    async fn get_access_token(&self) -> Result<String> {
        {
            let cache = self.lock_cache()?;
            if cache.is_valid(Utc::now()) {
                if let Some(token) = cache.token() {
                    return Ok(token);
                }
            }
        }

        // OAuth2 password grant for a script app; `read` scope is enough to
        // fetch subreddit listings.
        let mut form = vec![
            ("grant_type", "password".to_string()),
            ("username", self.config.username.clone()),
            ("password", self.config.password.clone()),
            ("scope", "read".to_string()),
        ];
        if let Ok(otp) = std::env::var("REDDIT_OTP") {
            if !otp.trim().is_empty() {
                form.push(("otp", otp));
            }
        }

        let response = self
            .send_with_retry(|| {
                self.client
                    .post(TOKEN_URL)
                    .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
                    .form(&form)
            })
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(MemeflowError::Provider(format!(
                "token request failed: status {status}, body {body}"
            )));
        }

        let parsed: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| MemeflowError::Provider(format!("invalid token response: {e}")))?;
        let token = parsed
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                MemeflowError::Provider("token response missing access_token".into())
            })?
            .to_string();
        let expires_in = parsed
            .get("expires_in")
            .and_then(|v| v.as_i64())
            .unwrap_or(45 * 60);

        let expires_at = Utc::now() + chrono::Duration::seconds(expires_in);
        self.lock_cache()?.store(token.clone(), expires_at);
        Ok(token)
    }

    /// Bounded exponential backoff with jitter on 429/5xx and transport
    /// errors. Exhausted retries surface the last failure to the caller,
    /// where the scheduler logs it as a cycle failure.
    async fn send_with_retry<F>(&self, mut build: F) -> Result<reqwest::Response>
    where
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let mut delay = RETRY_BASE_DELAY;

        for attempt in 0..=MAX_RETRIES {
            match build().send().await {
                Ok(response) if !is_retryable(response.status()) => return Ok(response),
                Ok(response) if attempt == MAX_RETRIES => return Ok(response),
                Err(e) if attempt == MAX_RETRIES => return Err(e.into()),
                Ok(response) => {
                    tracing::debug!(
                        status = %response.status(),
                        attempt,
                        "retryable response from reddit"
                    );
                }
                Err(e) => {
                    tracing::debug!(error = %e, attempt, "transport error talking to reddit");
                }
            }

            let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..1000));
            tokio::time::sleep(delay + jitter).await;
            delay *= 2;
        }

        unreachable!("retry loop returns on the final attempt")
    }

    fn lock_cache(&self) -> Result<std::sync::MutexGuard<'_, TokenCache>> {
        self.cache
            .lock()
            .map_err(|e| MemeflowError::Other(format!("token cache poisoned: {e}")))
    }
}

#[async_trait]
impl PostProvider for RedditProvider {
    async fn fetch_top_recent(&self, limit: usize) -> Result<Vec<Post>> {
        let token = self.get_access_token().await?;
        let url = format!(
            "https://oauth.reddit.com/r/{}/top?t=day&limit={}",
            self.config.subreddit, limit
        );

        let response = self
            .send_with_retry(|| self.client.get(&url).bearer_auth(&token))
            .await?;
        let response = response.error_for_status()?;

        let listing: Listing = response.json().await?;
        let posts = map_listing(listing, Utc::now());
        Ok(rank_posts(posts, limit))
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Convert the raw listing into domain posts, dropping anything older than
/// 24 hours. The listing is already restricted to `t=day`, but the window
/// is re-checked here so the provider's contract does not depend on it.
fn map_listing(listing: Listing, now: DateTime<Utc>) -> Vec<Post> {
    let cutoff = now - chrono::Duration::hours(24);
    let children = listing.data.map(|d| d.children).unwrap_or_default();

    let mut posts = Vec::with_capacity(children.len());
    for child in children {
        let Some(d) = child.data else { continue };
        if d.id.is_empty() {
            continue;
        }

        let permalink = format!(
            "https://www.reddit.com{}",
            d.permalink.as_deref().unwrap_or_default()
        );
        let content_url = d
            .url_overridden_by_dest
            .or(d.url)
            .filter(|u| Url::parse(u).is_ok())
            .unwrap_or_else(|| permalink.clone());
        let Some(created_at) = DateTime::from_timestamp(d.created_utc as i64, 0) else {
            continue;
        };

        if created_at < cutoff {
            continue;
        }

        posts.push(Post {
            external_id: d.id,
            title: d.title.unwrap_or_default(),
            author: d.author.unwrap_or_else(|| "unknown".into()),
            permalink,
            content_url,
            score: d.ups,
            comment_count: d.num_comments,
            created_at,
            thumbnail: d.thumbnail,
        });
    }

    posts
}

// Reddit listing envelope.
#[derive(Debug, Deserialize)]
struct Listing {
    data: Option<ListingData>,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: Option<ListingPost>,
}

#[derive(Debug, Deserialize)]
struct ListingPost {
    #[serde(default)]
    id: String,
    title: Option<String>,
    author: Option<String>,
    url: Option<String>,
    url_overridden_by_dest: Option<String>,
    permalink: Option<String>,
    thumbnail: Option<String>,
    #[serde(default)]
    ups: i64,
    #[serde(default)]
    num_comments: i64,
    #[serde(default)]
    created_utc: f64,
}
