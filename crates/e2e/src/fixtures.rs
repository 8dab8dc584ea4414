use anyhow::{Context, Result, ensure};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use uuid::Uuid;

use deskcheck_api::{
    CreateJobdeskRequest, CreateTodoRequest, Priority, PushSubscription, PushSubscriptionKeys,
    TodoStatus,
};

/// Short random tag so fixture titles never collide across runs.
pub fn unique_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// A high-priority jobdesk due in a week, assigned to `assignees`.
pub fn jobdesk_request(title: &str, assignees: Vec<String>) -> CreateJobdeskRequest {
    CreateJobdeskRequest {
        title: format!("{title} - {}", unique_suffix()),
        description: Some("Created by deskcheck; safe to delete".into()),
        assigned_to: assignees,
        due_date: Some((Utc::now() + Duration::days(7)).to_rfc3339()),
        priority: Some(Priority::High),
    }
}

/// A todo in `status`, optionally linked to a jobdesk.
pub fn todo_request(title: &str, status: TodoStatus, jobdesk_id: Option<&str>) -> CreateTodoRequest {
    CreateTodoRequest {
        title: format!("{title} {}", unique_suffix()),
        description: Some("Created by deskcheck".into()),
        priority: Some(Priority::High),
        status: Some(status),
        jobdesk_id: jobdesk_id.map(str::to_string),
        due_date: Some((Utc::now() + Duration::days(3)).format("%Y-%m-%d").to_string()),
    }
}

/// A syntactically valid browser push subscription pointing at a fake endpoint.
pub fn push_subscription() -> PushSubscription {
    let id = Uuid::new_v4();
    let mut point = Vec::with_capacity(65);
    point.push(0x04);
    for _ in 0..4 {
        point.extend_from_slice(id.as_bytes());
    }
    PushSubscription {
        endpoint: format!("https://fcm.googleapis.com/fcm/send/deskcheck-{id}"),
        expiration_time: None,
        keys: PushSubscriptionKeys {
            p256dh: URL_SAFE_NO_PAD.encode(&point),
            auth: URL_SAFE_NO_PAD.encode(&id.as_bytes()[..16]),
        },
    }
}

/// Decode a VAPID application server key and check it is an uncompressed
/// P-256 point: 65 bytes, leading `0x04`.
pub fn decode_vapid_public_key(key: &str) -> Result<Vec<u8>> {
    let bytes = URL_SAFE_NO_PAD
        .decode(key.trim_end_matches('='))
        .context("VAPID key is not URL-safe base64")?;
    ensure!(
        bytes.len() == 65,
        "VAPID key must be 65 bytes, got {}",
        bytes.len()
    );
    ensure!(bytes[0] == 0x04, "VAPID key must be an uncompressed point");
    Ok(bytes)
}
