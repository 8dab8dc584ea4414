use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use deskcheck_api::*;

use crate::error::{ApiError, Result, error_message};
use crate::retry::{RetryConfig, RetryOn, retry_send};

/// Typed HTTP client for the workspace-collaboration API.
///
/// Typed methods decode 2xx bodies and turn anything else into
/// [`ApiError::Status`]. The raw helpers return the `reqwest::Response`
/// untouched so callers can assert on rejection statuses (401/403/404/400).
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl ApiClient {
    /// Create a new client with the given base URL and timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create from an existing `reqwest::Client` (e.g. shared in tests).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an API path like `/auth/login`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    // ── Auth ──────────────────────────────────────────────────────────────

    /// `POST /api/auth/login`, retried on 429 / 5xx.
    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse> {
        let url = self.url("/auth/login");
        debug!(email = %req.email, "logging in");
        let resp = retry_send(
            || self.client.post(&url).json(req),
            &self.retry,
            RetryOn::Transient,
        )
        .await?;
        parse_response(resp).await
    }

    pub async fn me(&self, token: &str) -> Result<MeResponse> {
        let resp = self.get_with_auth("/auth/me", token).await?;
        parse_response(resp).await
    }

    // ── Users ─────────────────────────────────────────────────────────────

    pub async fn list_users(&self, token: &str) -> Result<UserListResponse> {
        let resp = self.get_with_auth("/users", token).await?;
        parse_response(resp).await
    }

    pub async fn update_user_password(
        &self,
        token: &str,
        user_id: &str,
        new_password: &str,
    ) -> Result<MessageResponse> {
        let resp = self
            .put_json_with_auth(
                &format!("/users/{user_id}/password"),
                token,
                &UpdatePasswordRequest {
                    new_password: Some(new_password.to_string()),
                },
            )
            .await?;
        parse_response(resp).await
    }

    // ── Jobdesks ──────────────────────────────────────────────────────────

    pub async fn list_jobdesks(&self, token: &str) -> Result<JobdeskListResponse> {
        let resp = self.get_with_auth("/jobdesks", token).await?;
        parse_response(resp).await
    }

    /// Retried on 429 only. A 5xx or timeout may already have created it.
    pub async fn create_jobdesk(
        &self,
        token: &str,
        req: &CreateJobdeskRequest,
    ) -> Result<JobdeskEnvelope> {
        let url = self.url("/jobdesks");
        let resp = retry_send(
            || self.client.post(&url).bearer_auth(token).json(req),
            &self.retry,
            RetryOn::RateLimit,
        )
        .await?;
        parse_response(resp).await
    }

    pub async fn update_jobdesk(
        &self,
        token: &str,
        id: &str,
        req: &UpdateJobdeskRequest,
    ) -> Result<JobdeskEnvelope> {
        let resp = self
            .put_json_with_auth(&format!("/jobdesks/{id}"), token, req)
            .await?;
        parse_response(resp).await
    }

    pub async fn update_jobdesk_status(
        &self,
        token: &str,
        id: &str,
        status: &JobdeskStatus,
    ) -> Result<MessageResponse> {
        let resp = self
            .put_json_with_auth(
                &format!("/jobdesks/{id}/status"),
                token,
                &UpdateJobdeskStatusRequest {
                    status: status.as_str().to_string(),
                },
            )
            .await?;
        parse_response(resp).await
    }

    pub async fn delete_jobdesk(&self, token: &str, id: &str) -> Result<DeleteJobdeskResponse> {
        let resp = self
            .delete_with_auth(&format!("/jobdesks/{id}"), token)
            .await?;
        parse_response(resp).await
    }

    // ── Todos & daily logs ────────────────────────────────────────────────

    pub async fn list_todos(&self, token: &str) -> Result<TodoListResponse> {
        let resp = self.get_with_auth("/todos", token).await?;
        parse_response(resp).await
    }

    /// Retried on 429 only, like [`ApiClient::create_jobdesk`].
    pub async fn create_todo(&self, token: &str, req: &CreateTodoRequest) -> Result<TodoEnvelope> {
        let url = self.url("/todos");
        let resp = retry_send(
            || self.client.post(&url).bearer_auth(token).json(req),
            &self.retry,
            RetryOn::RateLimit,
        )
        .await?;
        parse_response(resp).await
    }

    pub async fn convert_todo_to_log(
        &self,
        token: &str,
        todo_id: &str,
        hours_spent: f64,
    ) -> Result<ConvertToLogResponse> {
        let resp = self
            .post_json_with_auth(
                &format!("/todos/{todo_id}/convert-to-log"),
                token,
                &ConvertToLogRequest {
                    hours_spent: Some(hours_spent),
                },
            )
            .await?;
        parse_response(resp).await
    }

    pub async fn list_daily_logs(&self, token: &str) -> Result<DailyLogListResponse> {
        let resp = self.get_with_auth("/daily-logs", token).await?;
        parse_response(resp).await
    }

    // ── PWA ───────────────────────────────────────────────────────────────

    pub async fn vapid_key(&self) -> Result<VapidKeyResponse> {
        let resp = self.get_raw("/pwa/vapid-key").await?;
        parse_response(resp).await
    }

    pub async fn save_subscription(
        &self,
        token: &str,
        req: &SaveSubscriptionRequest,
    ) -> Result<MessageResponse> {
        let resp = self
            .post_json_with_auth("/pwa/save-subscription", token, req)
            .await?;
        parse_response(resp).await
    }

    pub async fn remove_subscription(
        &self,
        token: &str,
        endpoint: &str,
    ) -> Result<MessageResponse> {
        let resp = self
            .post_json_with_auth(
                "/pwa/remove-subscription",
                token,
                &RemoveSubscriptionRequest {
                    endpoint: endpoint.to_string(),
                },
            )
            .await?;
        parse_response(resp).await
    }

    pub async fn offline_bundle(&self, token: &str) -> Result<OfflineBundle> {
        let resp = self.get_with_auth("/pwa/offline-bundle", token).await?;
        parse_response(resp).await
    }

    // ── Raw helpers (for E2E / advanced usage) ────────────────────────────

    /// Authenticated GET returning the raw response.
    pub async fn get_with_auth(&self, path: &str, token: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?)
    }

    /// Authenticated POST with JSON body returning the raw response.
    pub async fn post_json_with_auth<T: Serialize + ?Sized>(
        &self,
        path: &str,
        token: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?)
    }

    /// Authenticated PUT with JSON body returning the raw response.
    pub async fn put_json_with_auth<T: Serialize + ?Sized>(
        &self,
        path: &str,
        token: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?)
    }

    /// Authenticated DELETE returning the raw response.
    pub async fn delete_with_auth(&self, path: &str, token: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await?)
    }

    /// Unauthenticated GET returning the raw response.
    pub async fn get_raw(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self.client.get(self.url(path)).send().await?)
    }

    /// Unauthenticated POST with JSON body returning the raw response.
    pub async fn post_json_raw<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self.client.post(self.url(path)).json(body).send().await?)
    }

    /// Unauthenticated PUT with JSON body returning the raw response.
    pub async fn put_json_raw<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self.client.put(self.url(path)).json(body).send().await?)
    }

    /// Unauthenticated DELETE returning the raw response.
    pub async fn delete_raw(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self.client.delete(self.url(path)).send().await?)
    }
}

/// Parse an HTTP response: return the deserialized body on 2xx,
/// or an error containing the status and the server's `error` message.
pub async fn parse_response<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status,
            message: error_message(&body),
        });
    }
    Ok(resp.json().await?)
}
