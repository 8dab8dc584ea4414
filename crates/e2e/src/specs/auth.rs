use anyhow::{Result, ensure};
use serde_json::json;

use deskcheck_api::{LoginRequest, MeResponse, Role};

use super::{expect_error, expect_status};
use crate::client::TestContext;

/// POST /api/auth/login → token + user with the super_admin role.
pub async fn login_super_admin(ctx: &TestContext) -> Result<()> {
    let admin = ctx.super_admin().await?;
    ensure!(!admin.token.is_empty(), "expected token");
    ensure!(!admin.user_id.is_empty(), "expected user id");
    ensure!(
        admin.role == Role::SuperAdmin,
        "expected super_admin, got {}",
        admin.role
    );
    Ok(())
}

/// Wrong password → 401 "Invalid credentials".
pub async fn login_wrong_password(ctx: &TestContext) -> Result<()> {
    let resp = ctx
        .post_json(
            "/auth/login",
            &LoginRequest {
                email: ctx.config().accounts.super_admin.email.clone(),
                password: "definitely-not-the-password".into(),
            },
        )
        .await?;
    expect_error(resp, 401, "Invalid credentials").await
}

/// Missing password → 400.
pub async fn login_missing_password(ctx: &TestContext) -> Result<()> {
    let resp = ctx
        .post_json(
            "/auth/login",
            &json!({ "email": ctx.config().accounts.super_admin.email }),
        )
        .await?;
    expect_status(resp, 400).await?;
    Ok(())
}

/// GET /api/auth/me → profile of the token's owner.
pub async fn me_returns_profile(ctx: &TestContext) -> Result<()> {
    let admin = ctx.super_admin().await?;
    let resp = ctx.get_authed("/auth/me", &admin.token).await?;
    let me: MeResponse = expect_status(resp, 200).await?.json().await?;
    ensure!(me.id == admin.user_id, "expected id {}, got {}", admin.user_id, me.id);
    ensure!(me.email == admin.email);
    ensure!(me.role == Role::SuperAdmin);
    Ok(())
}

/// Garbage bearer token → 401.
pub async fn me_invalid_token(ctx: &TestContext) -> Result<()> {
    let resp = ctx.get_authed("/auth/me", "invalid_token_12345").await?;
    expect_status(resp, 401).await?;
    Ok(())
}

/// JWT-shaped token with a bad signature → 401.
pub async fn me_malformed_jwt(ctx: &TestContext) -> Result<()> {
    let resp = ctx
        .get_authed(
            "/auth/me",
            "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.expired.token",
        )
        .await?;
    expect_status(resp, 401).await?;
    Ok(())
}

/// No Authorization header → 401.
pub async fn me_without_token(ctx: &TestContext) -> Result<()> {
    let resp = ctx.get("/auth/me").await?;
    expect_status(resp, 401).await?;
    Ok(())
}
