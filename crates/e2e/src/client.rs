use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use deskcheck_api::{
    CreateJobdeskRequest, CreateTodoRequest, Jobdesk, LoginRequest, Role, Todo,
};
use deskcheck_api_client::{ApiClient, RetryConfig};
use deskcheck_runtime_config::{Credentials, SuiteConfig};

use crate::db::UserStore;
use crate::runner::Skipped;

/// Holds connection info and lazily-established role sessions for a run.
pub struct TestContext {
    pub api: ApiClient,
    config: SuiteConfig,
    super_admin: OnceCell<TestUser>,
    karyawan: OnceCell<TestUser>,
    pengurus: OnceCell<TestUser>,
    store: Option<UserStore>,
}

/// A logged-in account.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub user_id: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub token: String,
}

impl TestContext {
    /// Build a context from config. No network traffic happens until a
    /// session is first requested.
    pub fn new(config: SuiteConfig) -> Result<Self> {
        let retry = RetryConfig {
            max_retries: config.run.max_retries,
            delays: config.run.retry_delays_secs.clone(),
        };
        let api = ApiClient::new(
            &config.target.base_url,
            Duration::from_secs(config.target.timeout_secs),
        )
        .context("failed to build HTTP client")?
        .with_retry(retry);

        Ok(Self {
            api,
            config,
            super_admin: OnceCell::new(),
            karyawan: OnceCell::new(),
            pengurus: OnceCell::new(),
            store: None,
        })
    }

    /// Like [`TestContext::new`], additionally connecting to MongoDB when a
    /// `database.mongo_url` is configured.
    pub async fn connect(config: SuiteConfig) -> Result<Self> {
        let store = match config.database.mongo_url.as_deref() {
            Some(url) => Some(UserStore::connect(url, &config.database.name).await?),
            None => None,
        };
        let mut ctx = Self::new(config)?;
        ctx.store = store;
        Ok(ctx)
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Build a full API URL from a path like `/auth/me`.
    pub fn url(&self, path: &str) -> String {
        self.api.url(path)
    }

    /// Direct database access, or a [`Skipped`] error when none is configured.
    pub fn require_store(&self) -> Result<&UserStore> {
        self.store
            .as_ref()
            .ok_or_else(|| Skipped::new("no database configured (set MONGO_URL)").into())
    }

    /// Log in with explicit credentials.
    pub async fn login(&self, creds: &Credentials) -> Result<TestUser> {
        let resp = self
            .api
            .login(&LoginRequest {
                email: creds.email.clone(),
                password: creds.password.clone(),
            })
            .await
            .with_context(|| format!("login as {} failed", creds.email))?;

        debug!(user_id = %resp.user.id, role = %resp.user.role, "logged in");
        Ok(TestUser {
            user_id: resp.user.id,
            email: resp.user.email,
            password: creds.password.clone(),
            role: resp.user.role,
            token: resp.token,
        })
    }

    /// Session of the configured super admin, logged in once per run.
    pub async fn super_admin(&self) -> Result<&TestUser> {
        self.super_admin
            .get_or_try_init(|| async {
                let user = self.login(&self.config.accounts.super_admin).await?;
                info!(email = %user.email, "super admin session ready");
                Ok(user)
            })
            .await
    }

    /// Session of the configured karyawan (regular employee), logged in once per run.
    pub async fn karyawan(&self) -> Result<&TestUser> {
        self.karyawan
            .get_or_try_init(|| async {
                let user = self.login(&self.config.accounts.karyawan).await?;
                info!(email = %user.email, "karyawan session ready");
                Ok(user)
            })
            .await
    }

    /// Session of the optional pengurus (manager) account. Checks that need it
    /// are skipped when `accounts.pengurus` is not configured.
    pub async fn pengurus(&self) -> Result<&TestUser> {
        let Some(creds) = self.config.accounts.pengurus.as_ref() else {
            return Err(Skipped::new(
                "no pengurus account configured (set DESKCHECK_PENGURUS_EMAIL)",
            )
            .into());
        };
        self.pengurus
            .get_or_try_init(|| async {
                let user = self.login(creds).await?;
                info!(email = %user.email, "pengurus session ready");
                Ok(user)
            })
            .await
    }

    // ── Fixtures through the API ──────────────────────────────────────

    /// Super admin creates a jobdesk.
    pub async fn create_jobdesk(&self, req: &CreateJobdeskRequest) -> Result<Jobdesk> {
        let admin = self.super_admin().await?;
        let envelope = self
            .api
            .create_jobdesk(&admin.token, req)
            .await
            .context("create jobdesk fixture failed")?;
        debug!(jobdesk_id = %envelope.jobdesk.id, "created jobdesk fixture");
        Ok(envelope.jobdesk)
    }

    /// `user` creates a todo.
    pub async fn create_todo(&self, user: &TestUser, req: &CreateTodoRequest) -> Result<Todo> {
        let envelope = self
            .api
            .create_todo(&user.token, req)
            .await
            .context("create todo fixture failed")?;
        debug!(todo_id = %envelope.todo.id, "created todo fixture");
        Ok(envelope.todo)
    }

    // ── HTTP convenience methods (delegate to ApiClient) ──────────────

    pub async fn get_authed(&self, path: &str, token: &str) -> Result<reqwest::Response> {
        Ok(self.api.get_with_auth(path, token).await?)
    }

    pub async fn post_json_authed<T: Serialize + ?Sized>(
        &self,
        path: &str,
        token: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self.api.post_json_with_auth(path, token, body).await?)
    }

    pub async fn put_json_authed<T: Serialize + ?Sized>(
        &self,
        path: &str,
        token: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self.api.put_json_with_auth(path, token, body).await?)
    }

    pub async fn delete_authed(&self, path: &str, token: &str) -> Result<reqwest::Response> {
        Ok(self.api.delete_with_auth(path, token).await?)
    }

    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self.api.get_raw(path).await?)
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self.api.post_json_raw(path, body).await?)
    }

    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self.api.put_json_raw(path, body).await?)
    }

    pub async fn delete(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self.api.delete_raw(path).await?)
    }
}
