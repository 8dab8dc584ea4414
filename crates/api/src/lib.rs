//! Wire types for the workspace-collaboration REST API.
//!
//! The API is owned by an external application; these structs mirror the JSON
//! it speaks (camelCase keys) closely enough for deskcheck to build requests
//! and assert on responses. Unknown fields are ignored on decode so that the
//! server can grow without breaking the suite.

use serde::{Deserialize, Serialize};

/// Prefix the server writes into `notes` when a todo is converted to a daily log.
pub const FROM_TODO_NOTES_PREFIX: &str = "**[From To-Do]**";

/// Minimum accepted length for `PUT /api/users/:id/password`.
pub const MIN_PASSWORD_LEN: usize = 6;

// ─── Shared Enums ────────────────────────────────────────────────────────────

/// Account role inside the workspace application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Pengurus,
    Karyawan,
    #[serde(other)]
    Other,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Pengurus => "pengurus",
            Self::Karyawan => "karyawan",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a jobdesk, as accepted by `PUT /api/jobdesks/:id/status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobdeskStatus {
    Pending,
    InProgress,
    Completed,
    #[serde(other)]
    Other,
}

impl JobdeskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for JobdeskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Todo status. Only `done` todos may be converted to a daily log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Done,
    #[serde(other)]
    Other,
}

impl TodoStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    #[serde(other)]
    Other,
}

// ─── Generic responses ───────────────────────────────────────────────────────

/// Body of every non-2xx response: `{"error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: String,
}

/// Body of mutations that return only a confirmation message.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

// ─── Auth ────────────────────────────────────────────────────────────────────

/// Email + password login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public user profile, embedded in login responses and listed by `GET /api/users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub division_id: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Returned by `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

/// Returned by `GET /api/auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub division_id: Option<String>,
}

/// Returned by `GET /api/users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<UserSummary>,
}

/// Body of `PUT /api/users/:id/password`. `None` serializes to `{}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
}

// ─── Jobdesks ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Jobdesk {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assigned_to: Vec<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    pub status: JobdeskStatus,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Body of `POST /api/jobdesks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobdeskRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub assigned_to: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

/// Body of `PUT /api/jobdesks/:id`. The default value is the empty update `{}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobdeskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl UpdateJobdeskRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.assigned_to.is_none()
            && self.due_date.is_none()
    }
}

/// Body of `PUT /api/jobdesks/:id/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateJobdeskStatusRequest {
    pub status: String,
}

/// Returned by jobdesk create and edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobdeskEnvelope {
    #[serde(default)]
    pub message: String,
    pub jobdesk: Jobdesk,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobdeskListResponse {
    pub jobdesks: Vec<Jobdesk>,
}

/// Returned by `DELETE /api/jobdesks/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteJobdeskResponse {
    #[serde(default)]
    pub message: String,
    pub deleted_jobdesk_id: String,
}

// ─── Todos & daily logs ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TodoStatus,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub jobdesk_id: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub converted_to_log: bool,
}

/// Body of `POST /api/todos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TodoStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobdesk_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoEnvelope {
    #[serde(default)]
    pub message: String,
    pub todo: Todo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoListResponse {
    pub todos: Vec<Todo>,
}

/// Body of `POST /api/todos/:id/convert-to-log`. `None` serializes to `{}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConvertToLogRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_spent: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub id: String,
    pub user_id: String,
    pub jobdesk_id: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub hours_spent: f64,
    #[serde(default)]
    pub date: Option<String>,
}

impl DailyLog {
    /// Whether this log was produced by a todo conversion.
    pub fn is_from_todo(&self) -> bool {
        self.notes.contains(FROM_TODO_NOTES_PREFIX)
    }
}

/// Returned by a successful todo conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertToLogResponse {
    #[serde(default)]
    pub message: String,
    pub log: DailyLog,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyLogListResponse {
    pub logs: Vec<DailyLog>,
}

/// Notes the server is expected to write for a converted todo with the given title.
pub fn converted_notes_prefix(todo_title: &str) -> String {
    format!("{FROM_TODO_NOTES_PREFIX} {todo_title}")
}

// ─── PWA ─────────────────────────────────────────────────────────────────────

/// Returned by `GET /api/pwa/vapid-key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VapidKeyResponse {
    pub public_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushSubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// A browser push subscription as produced by `PushManager.subscribe()`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<i64>,
    pub keys: PushSubscriptionKeys,
}

/// Body of `POST /api/pwa/save-subscription`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveSubscriptionRequest {
    pub subscription: serde_json::Value,
}

impl SaveSubscriptionRequest {
    pub fn new(subscription: &PushSubscription) -> serde_json::Result<Self> {
        Ok(Self {
            subscription: serde_json::to_value(subscription)?,
        })
    }
}

/// Body of `POST /api/pwa/remove-subscription`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveSubscriptionRequest {
    pub endpoint: String,
}

/// Returned by `GET /api/pwa/offline-bundle`: the data a PWA caches for offline use.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OfflineBundle {
    #[serde(default)]
    pub jobdesks: Vec<Jobdesk>,
    #[serde(default)]
    pub todos: Vec<Todo>,
    #[serde(default)]
    pub daily_logs: Vec<DailyLog>,
    #[serde(default)]
    pub generated_at: Option<String>,
}
