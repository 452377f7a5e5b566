//! Metabase REST API client.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;
use xavyo_connector::annotations::RateLimitDescription;

use crate::client::{ClientResponse, DirectoryClient};
use crate::models::{
    CreateUserRequest, Group, MembershipListing, MembershipRequest, PageOptions, SessionProperties,
    User, UserListResponse, UserPage, VersionInfo,
};
use crate::rate_limit::{describe_rate_limit, retry_after_secs};
use crate::{MetabaseConfig, MetabaseCredentials, MetabaseError, MetabaseResult};

const API_KEY_HEADER: &str = "x-api-key";

/// Error body Metabase returns on failures.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// HTTP implementation of [`DirectoryClient`].
#[derive(Debug)]
pub struct MetabaseClient {
    http_client: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
    max_retries: u32,
    retry_delay: Duration,
    paid_plan: AtomicBool,
}

impl MetabaseClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: &MetabaseConfig, credentials: MetabaseCredentials) -> MetabaseResult<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| MetabaseError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.api_base()?,
            api_key: credentials.api_key,
            max_retries: config.max_retries,
            retry_delay: Duration::from_secs(1),
            paid_plan: AtomicBool::new(false),
        })
    }

    /// Override the initial backoff between transient-error retries.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn url(&self, path: &str) -> MetabaseResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Send a request, retrying 502/503/504 with exponential backoff.
    ///
    /// Yields the raw body on success. A 429 is surfaced immediately with its
    /// rate-limit description.
    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> ClientResponse<String> {
        let url = match self.url(path) {
            Ok(url) => url,
            Err(e) => return ClientResponse::err(e),
        };

        let mut retries = 0;
        let mut delay = self.retry_delay;

        loop {
            let mut request = self
                .http_client
                .request(method.clone(), url.clone())
                .header(API_KEY_HEADER, self.api_key.expose_secret());
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(b) = body {
                request = request.json(b);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => return ClientResponse::err(MetabaseError::Http(e)),
            };
            let status = response.status();
            let now = Utc::now();
            let rate_limit = describe_rate_limit(status, response.headers(), now);

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = retry_after_secs(response.headers(), now);
                warn!(%method, path, ?retry_after, "Metabase rate limit exceeded");
                return respond(
                    Err(MetabaseError::RateLimited {
                        retry_after_secs: retry_after,
                    }),
                    rate_limit,
                );
            }

            if matches!(
                status,
                StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
            ) && retries < self.max_retries
            {
                retries += 1;
                warn!(
                    "Transient error {}, retry {}/{} after {:?}",
                    status, retries, self.max_retries, delay
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                continue;
            }

            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => return respond(Err(MetabaseError::Http(e)), rate_limit),
            };

            if status.is_success() {
                debug!(%method, path, status = status.as_u16(), "Metabase request succeeded");
                return respond(Ok(text), rate_limit);
            }

            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(text);
            return respond(
                Err(MetabaseError::Api {
                    status: status.as_u16(),
                    message,
                }),
                rate_limit,
            );
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResponse<T> {
        decode(self.execute::<()>(Method::GET, path, query, None).await)
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ClientResponse<T> {
        decode(self.execute(method, path, &[], Some(body)).await)
    }

    async fn send_empty(&self, method: Method, path: &str) -> ClientResponse<()> {
        let response = self.execute::<()>(method, path, &[], None).await;
        respond(response.result.map(|_| ()), response.rate_limit)
    }
}

fn respond<T>(result: MetabaseResult<T>, rate_limit: Option<RateLimitDescription>) -> ClientResponse<T> {
    ClientResponse { result, rate_limit }
}

fn decode<T: DeserializeOwned>(response: ClientResponse<String>) -> ClientResponse<T> {
    let result = response
        .result
        .and_then(|text| serde_json::from_str(&text).map_err(MetabaseError::from));
    respond(result, response.rate_limit)
}

/// Compute the next cursor for an offset-paged listing.
fn next_offset(offset: u64, returned: usize, total: Option<u64>, page_size: u32) -> String {
    let next = offset + returned as u64;
    let more = match total {
        Some(total) => next < total,
        None => returned > 0 && returned as u64 >= u64::from(page_size),
    };
    if more {
        next.to_string()
    } else {
        String::new()
    }
}

#[async_trait]
impl DirectoryClient for MetabaseClient {
    #[instrument(skip(self))]
    async fn list_users(&self, options: &PageOptions) -> ClientResponse<UserPage> {
        let offset: u64 = if options.page_token.is_empty() {
            0
        } else {
            match options.page_token.parse() {
                Ok(offset) => offset,
                Err(_) => {
                    return ClientResponse::err(MetabaseError::InvalidPageToken(
                        options.page_token.clone(),
                    ))
                }
            }
        };

        let query = [
            ("limit", options.page_size.to_string()),
            ("offset", offset.to_string()),
            ("status", "all".to_string()),
        ];
        let response: ClientResponse<UserListResponse> = self.get_json("api/user", &query).await;
        let result = response.result.map(|listing| UserPage {
            next_page_token: next_offset(offset, listing.data.len(), listing.total, options.page_size),
            users: listing.data,
        });
        respond(result, response.rate_limit)
    }

    #[instrument(skip(self))]
    async fn list_groups(&self) -> ClientResponse<Vec<Group>> {
        self.get_json("api/permissions/group", &[]).await
    }

    #[instrument(skip(self))]
    async fn list_memberships(&self) -> ClientResponse<MembershipListing> {
        self.get_json("api/permissions/membership", &[]).await
    }

    #[instrument(skip(self))]
    async fn add_user_to_group(&self, request: &MembershipRequest) -> ClientResponse<()> {
        let response: ClientResponse<serde_json::Value> = self
            .send_json(Method::POST, "api/permissions/membership", request)
            .await;
        respond(response.result.map(|_| ()), response.rate_limit)
    }

    #[instrument(skip(self))]
    async fn remove_user_from_group(&self, membership_id: i64) -> ClientResponse<()> {
        self.send_empty(
            Method::DELETE,
            &format!("api/permissions/membership/{membership_id}"),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn update_user_active_status(
        &self,
        user_id: i64,
        active: bool,
    ) -> ClientResponse<Option<User>> {
        if active {
            let response: ClientResponse<User> = self
                .send_json(
                    Method::PUT,
                    &format!("api/user/{user_id}/reactivate"),
                    &serde_json::json!({}),
                )
                .await;
            return respond(response.result.map(Some), response.rate_limit);
        }

        // Deactivation answers with a bare success flag.
        let response = self
            .send_empty(Method::DELETE, &format!("api/user/{user_id}"))
            .await;
        respond(response.result.map(|()| None), response.rate_limit)
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn create_user(&self, request: &CreateUserRequest) -> ClientResponse<User> {
        self.send_json(Method::POST, "api/user", request).await
    }

    fn is_paid_plan(&self) -> bool {
        self.paid_plan.load(Ordering::Relaxed)
    }

    #[instrument(skip(self))]
    async fn get_version(&self) -> ClientResponse<VersionInfo> {
        let response: ClientResponse<SessionProperties> =
            self.get_json("api/session/properties", &[]).await;
        let result = response.result.map(|props| {
            self.paid_plan
                .store(props.version.is_paid_plan(), Ordering::Relaxed);
            props.version
        });
        respond(result, response.rate_limit)
    }
}
