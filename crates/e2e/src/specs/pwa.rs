use anyhow::{Context, Result, ensure};
use serde_json::json;

use deskcheck_api::SaveSubscriptionRequest;

use super::{expect_error, expect_status};
use crate::client::TestContext;
use crate::fixtures;

/// GET /api/pwa/vapid-key → URL-safe base64 uncompressed P-256 point.
pub async fn vapid_key_is_p256_point(ctx: &TestContext) -> Result<()> {
    let body = ctx
        .api
        .vapid_key()
        .await
        .context("expected {publicKey}")?;
    fixtures::decode_vapid_public_key(&body.public_key)?;
    Ok(())
}

/// No token → 401.
pub async fn save_subscription_requires_auth(ctx: &TestContext) -> Result<()> {
    let req = SaveSubscriptionRequest::new(&fixtures::push_subscription())?;
    let resp = ctx.post_json("/pwa/save-subscription", &req).await?;
    expect_status(resp, 401).await?;
    Ok(())
}

/// Subscription without an endpoint → 400.
pub async fn save_subscription_rejects_missing_endpoint(ctx: &TestContext) -> Result<()> {
    let karyawan = ctx.karyawan().await?;
    let sub = fixtures::push_subscription();
    let body = json!({ "subscription": { "keys": sub.keys } });
    let resp = ctx
        .post_json_authed("/pwa/save-subscription", &karyawan.token, &body)
        .await?;
    expect_error(resp, 400, "endpoint").await
}

/// Save then remove the same subscription → 200 both times.
pub async fn save_and_remove_subscription(ctx: &TestContext) -> Result<()> {
    let karyawan = ctx.karyawan().await?;
    let sub = fixtures::push_subscription();

    let saved = ctx
        .api
        .save_subscription(&karyawan.token, &SaveSubscriptionRequest::new(&sub)?)
        .await
        .context("save-subscription failed")?;
    ensure!(!saved.message.is_empty(), "expected a message");

    ctx.api
        .remove_subscription(&karyawan.token, &sub.endpoint)
        .await
        .context("remove-subscription failed")?;
    Ok(())
}

/// No token → 401.
pub async fn offline_bundle_requires_auth(ctx: &TestContext) -> Result<()> {
    let resp = ctx.get("/pwa/offline-bundle").await?;
    expect_status(resp, 401).await?;
    Ok(())
}

/// The bundle carries the caller's jobdesks and todos.
pub async fn offline_bundle_contains_user_data(ctx: &TestContext) -> Result<()> {
    let karyawan = ctx.karyawan().await?;
    let jobdesk = ctx
        .create_jobdesk(&fixtures::jobdesk_request(
            "Offline Bundle Jobdesk",
            vec![karyawan.user_id.clone()],
        ))
        .await?;
    let todo = ctx
        .create_todo(
            karyawan,
            &fixtures::todo_request(
                "Offline Bundle Todo",
                deskcheck_api::TodoStatus::Pending,
                Some(&jobdesk.id),
            ),
        )
        .await?;

    let bundle = ctx
        .api
        .offline_bundle(&karyawan.token)
        .await
        .context("expected {jobdesks, todos, dailyLogs}")?;

    ensure!(
        bundle.jobdesks.iter().any(|j| j.id == jobdesk.id),
        "assigned jobdesk missing from offline bundle"
    );
    ensure!(
        bundle.todos.iter().any(|t| t.id == todo.id),
        "own todo missing from offline bundle"
    );
    Ok(())
}
