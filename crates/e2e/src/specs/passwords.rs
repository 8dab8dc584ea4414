use anyhow::{Context, Result, bail, ensure};

use deskcheck_api::{MIN_PASSWORD_LEN, UpdatePasswordRequest};
use deskcheck_api_client::ApiError;
use deskcheck_runtime_config::Credentials;
use tracing::{info, warn};

use super::{expect_error, expect_status};
use crate::client::TestContext;
use crate::db::is_bcrypt_hash;
use crate::fixtures;

fn password_path(user_id: &str) -> String {
    format!("/users/{user_id}/password")
}

fn new_password(value: &str) -> UpdatePasswordRequest {
    UpdatePasswordRequest {
        new_password: Some(value.to_string()),
    }
}

/// No token → 403.
pub async fn update_requires_token(ctx: &TestContext) -> Result<()> {
    let karyawan = ctx.karyawan().await?;
    let resp = ctx
        .put_json(&password_path(&karyawan.user_id), &new_password("newpass123"))
        .await?;
    expect_status(resp, 403).await?;
    Ok(())
}

/// Karyawan may not reset passwords, not even their own → 403.
pub async fn update_denied_for_karyawan(ctx: &TestContext) -> Result<()> {
    let karyawan = ctx.karyawan().await?;
    let resp = ctx
        .put_json_authed(
            &password_path(&karyawan.user_id),
            &karyawan.token,
            &new_password("newpass123"),
        )
        .await?;
    expect_status(resp, 403).await?;
    Ok(())
}

/// Super admin gets past the role gate: a too-short password is a 400, not a 403.
pub async fn super_admin_passes_authorization(ctx: &TestContext) -> Result<()> {
    let admin = ctx.super_admin().await?;
    let karyawan = ctx.karyawan().await?;
    let resp = ctx
        .put_json_authed(
            &password_path(&karyawan.user_id),
            &admin.token,
            &new_password("123"),
        )
        .await?;
    expect_status(resp, 400).await?;
    Ok(())
}

/// `{}` → 400.
pub async fn update_requires_new_password(ctx: &TestContext) -> Result<()> {
    let admin = ctx.super_admin().await?;
    let karyawan = ctx.karyawan().await?;
    let resp = ctx
        .put_json_authed(
            &password_path(&karyawan.user_id),
            &admin.token,
            &UpdatePasswordRequest::default(),
        )
        .await?;
    expect_status(resp, 400).await?;
    Ok(())
}

/// Five characters → 400 naming the minimum length.
pub async fn update_rejects_short_password(ctx: &TestContext) -> Result<()> {
    let admin = ctx.super_admin().await?;
    let karyawan = ctx.karyawan().await?;
    let short = "1".repeat(MIN_PASSWORD_LEN - 1);
    let resp = ctx
        .put_json_authed(
            &password_path(&karyawan.user_id),
            &admin.token,
            &new_password(&short),
        )
        .await?;
    expect_error(resp, 400, &format!("{MIN_PASSWORD_LEN} characters")).await
}

/// Unknown user id → 404.
pub async fn update_unknown_user_not_found(ctx: &TestContext) -> Result<()> {
    let admin = ctx.super_admin().await?;
    let resp = ctx
        .put_json_authed(
            &password_path("nonexistent-user-id-12345"),
            &admin.token,
            &new_password("validpass123"),
        )
        .await?;
    expect_status(resp, 404).await?;
    Ok(())
}

// ── Destructive: these change a real account's password ─────────────────

/// Reset the karyawan password, log in with it, then put the old one back.
pub async fn update_allows_login_with_new_password(ctx: &TestContext) -> Result<()> {
    let admin = ctx.super_admin().await?;
    let karyawan = ctx.karyawan().await?;
    let original = ctx.config().accounts.karyawan.clone();
    let changed = Credentials::new(
        &original.email,
        &format!("deskcheck-{}", fixtures::unique_suffix()),
    );

    ctx.api
        .update_user_password(&admin.token, &karyawan.user_id, &changed.password)
        .await
        .context("password update failed")?;
    info!(user_id = %karyawan.user_id, "karyawan password changed");

    let verified = verify_password_swap(ctx, &original, &changed).await;

    let restored = ctx
        .api
        .update_user_password(&admin.token, &karyawan.user_id, &original.password)
        .await;
    if let Err(e) = &restored {
        warn!(user_id = %karyawan.user_id, "failed to restore password: {e}");
    }

    verified?;
    restored.context("failed to restore the original password")?;
    Ok(())
}

async fn verify_password_swap(
    ctx: &TestContext,
    original: &Credentials,
    changed: &Credentials,
) -> Result<()> {
    let session = ctx
        .login(changed)
        .await
        .context("login with the new password failed")?;
    ensure!(!session.token.is_empty(), "expected token");

    match ctx.login(original).await {
        Ok(_) => bail!("old password still accepted after update"),
        Err(e) => {
            let status = e.downcast_ref::<ApiError>().and_then(ApiError::status);
            ensure!(
                status == Some(reqwest::StatusCode::UNAUTHORIZED),
                "old password should be rejected with 401: {e:#}"
            );
        }
    }
    Ok(())
}

/// The stored hash changes, is bcrypt, and verifies against the new password.
/// The original hash is written back directly.
pub async fn update_stores_bcrypt_hash(ctx: &TestContext) -> Result<()> {
    let store = ctx.require_store()?;
    let admin = ctx.super_admin().await?;

    let user_id = store
        .find_user_excluding(&admin.email)
        .await?
        .context("no non-admin user in the database")?;
    let original_hash = store
        .password_hash(&user_id)
        .await?
        .context("user has no stored password")?;

    let plain = format!("newpass-{}", fixtures::unique_suffix());
    ctx.api
        .update_user_password(&admin.token, &user_id, &plain)
        .await
        .context("password update failed")?;

    let verified = verify_stored_hash(ctx, &user_id, &original_hash, &plain).await;

    let restored = store.restore_password_hash(&user_id, &original_hash).await;
    match &restored {
        Ok(true) => info!(%user_id, "original password hash restored"),
        Ok(false) => warn!(%user_id, "user vanished before hash restore"),
        Err(e) => warn!(%user_id, "failed to restore password hash: {e:#}"),
    }

    verified?;
    ensure!(restored?, "user {user_id} not found while restoring hash");
    Ok(())
}

async fn verify_stored_hash(
    ctx: &TestContext,
    user_id: &str,
    original_hash: &str,
    plain: &str,
) -> Result<()> {
    let store = ctx.require_store()?;
    let stored = store
        .password_hash(user_id)
        .await?
        .context("password missing after update")?;

    ensure!(stored != original_hash, "stored hash did not change");
    ensure!(stored != plain, "password stored in plaintext");
    ensure!(is_bcrypt_hash(&stored), "not a bcrypt hash: {stored:.7}...");
    ensure!(
        bcrypt::verify(plain, &stored).context("stored hash is unreadable")?,
        "stored hash does not match the new password"
    );
    Ok(())
}
