use anyhow::{Context, Result, ensure};
use uuid::Uuid;

use deskcheck_api::{
    JobdeskListResponse, JobdeskStatus, Priority, Role, TodoStatus, UpdateJobdeskRequest,
    UpdateJobdeskStatusRequest, UserListResponse,
};

use super::{expect_error, expect_status};
use crate::client::TestContext;
use crate::fixtures;

fn title_update() -> UpdateJobdeskRequest {
    UpdateJobdeskRequest {
        title: Some(format!("Updated Test Jobdesk Title {}", fixtures::unique_suffix())),
        description: Some("Updated description for testing".into()),
        priority: Some(Priority::Medium),
        ..Default::default()
    }
}

/// Jobdesk assigned to the configured karyawan.
async fn karyawan_jobdesk(ctx: &TestContext) -> Result<deskcheck_api::Jobdesk> {
    let karyawan = ctx.karyawan().await?;
    ctx.create_jobdesk(&fixtures::jobdesk_request(
        "Test Jobdesk for Edit/Delete",
        vec![karyawan.user_id.clone()],
    ))
    .await
}

/// GET /api/jobdesks as super admin → 200 with a list.
pub async fn list_jobdesks(ctx: &TestContext) -> Result<()> {
    let admin = ctx.super_admin().await?;
    let resp = ctx.get_authed("/jobdesks", &admin.token).await?;
    expect_status(resp, 200)
        .await?
        .json::<JobdeskListResponse>()
        .await
        .context("expected {jobdesks: [...]}")?;
    Ok(())
}

/// Assignees picked from GET /api/users (role karyawan) → created pending jobdesk.
pub async fn create_for_listed_karyawan(ctx: &TestContext) -> Result<()> {
    let admin = ctx.super_admin().await?;
    let users: UserListResponse = ctx
        .api
        .list_users(&admin.token)
        .await
        .context("GET /users failed")?;
    let assignees: Vec<String> = users
        .users
        .iter()
        .filter(|u| u.role == Role::Karyawan)
        .take(2)
        .map(|u| u.id.clone())
        .collect();
    ensure!(!assignees.is_empty(), "no karyawan users found");

    let req = fixtures::jobdesk_request("Test Jobdesk", assignees.clone());
    let jobdesk = ctx.create_jobdesk(&req).await?;
    ensure!(jobdesk.title == req.title, "title not echoed back");
    ensure!(jobdesk.assigned_to == assignees, "assignees not echoed back");
    ensure!(
        jobdesk.status == JobdeskStatus::Pending,
        "new jobdesk should be pending, got {}",
        jobdesk.status
    );

    let list = ctx.api.list_jobdesks(&admin.token).await?;
    ensure!(
        list.jobdesks.iter().any(|j| j.id == jobdesk.id),
        "created jobdesk missing from list"
    );
    Ok(())
}

/// Empty assignee list → 400.
pub async fn create_requires_assignee(ctx: &TestContext) -> Result<()> {
    let admin = ctx.super_admin().await?;
    let req = fixtures::jobdesk_request("Unassigned Jobdesk", Vec::new());
    let resp = ctx.post_json_authed("/jobdesks", &admin.token, &req).await?;
    expect_status(resp, 400).await?;
    Ok(())
}

/// Super admin PUT /api/jobdesks/{id} → 200 with the updated jobdesk.
pub async fn edit_as_super_admin(ctx: &TestContext) -> Result<()> {
    let admin = ctx.super_admin().await?;
    let jobdesk = karyawan_jobdesk(ctx).await?;
    let update = title_update();

    let body = ctx
        .api
        .update_jobdesk(&admin.token, &jobdesk.id, &update)
        .await
        .context("super admin edit failed")?;
    ensure!(
        Some(&body.jobdesk.title) == update.title.as_ref(),
        "expected updated title, got {:?}",
        body.jobdesk.title
    );
    ensure!(body.jobdesk.id == jobdesk.id);
    Ok(())
}

/// Pengurus may edit jobdesks → 200 with the updated jobdesk.
pub async fn edit_allowed_for_pengurus(ctx: &TestContext) -> Result<()> {
    let pengurus = ctx.pengurus().await?;
    let jobdesk = karyawan_jobdesk(ctx).await?;
    let update = title_update();

    let body = ctx
        .api
        .update_jobdesk(&pengurus.token, &jobdesk.id, &update)
        .await
        .context("pengurus edit failed")?;
    ensure!(
        Some(&body.jobdesk.title) == update.title.as_ref(),
        "expected updated title, got {:?}",
        body.jobdesk.title
    );
    Ok(())
}

/// Karyawan cannot edit, even a jobdesk assigned to them → 403.
pub async fn edit_denied_for_karyawan(ctx: &TestContext) -> Result<()> {
    let karyawan = ctx.karyawan().await?;
    let jobdesk = karyawan_jobdesk(ctx).await?;
    let resp = ctx
        .put_json_authed(
            &format!("/jobdesks/{}", jobdesk.id),
            &karyawan.token,
            &title_update(),
        )
        .await?;
    expect_status(resp, 403).await?;
    Ok(())
}

/// No token → 403 (the role gate runs before authentication on this route).
pub async fn edit_denied_without_token(ctx: &TestContext) -> Result<()> {
    let jobdesk = karyawan_jobdesk(ctx).await?;
    let resp = ctx
        .put_json(&format!("/jobdesks/{}", jobdesk.id), &title_update())
        .await?;
    expect_status(resp, 403).await?;
    Ok(())
}

/// `{}` → 400.
pub async fn edit_rejects_empty_update(ctx: &TestContext) -> Result<()> {
    let admin = ctx.super_admin().await?;
    let jobdesk = karyawan_jobdesk(ctx).await?;
    let resp = ctx
        .put_json_authed(
            &format!("/jobdesks/{}", jobdesk.id),
            &admin.token,
            &UpdateJobdeskRequest::default(),
        )
        .await?;
    expect_status(resp, 400).await?;
    Ok(())
}

/// Unknown id → 404.
pub async fn edit_unknown_id_not_found(ctx: &TestContext) -> Result<()> {
    let admin = ctx.super_admin().await?;
    let resp = ctx
        .put_json_authed(
            &format!("/jobdesks/{}", Uuid::new_v4()),
            &admin.token,
            &title_update(),
        )
        .await?;
    expect_status(resp, 404).await?;
    Ok(())
}

/// PUT /api/jobdesks/{id}/status with in_progress → 200 and the list reflects it.
pub async fn status_update_accepts_known_status(ctx: &TestContext) -> Result<()> {
    let admin = ctx.super_admin().await?;
    let jobdesk = karyawan_jobdesk(ctx).await?;

    ctx.api
        .update_jobdesk_status(&admin.token, &jobdesk.id, &JobdeskStatus::InProgress)
        .await
        .context("status update failed")?;

    let list = ctx.api.list_jobdesks(&admin.token).await?;
    let updated = list
        .jobdesks
        .iter()
        .find(|j| j.id == jobdesk.id)
        .context("jobdesk missing from list")?;
    ensure!(
        updated.status == JobdeskStatus::InProgress,
        "expected in_progress, got {}",
        updated.status
    );
    Ok(())
}

/// Status outside pending/in_progress/completed → 400 "Invalid status".
pub async fn status_update_rejects_unknown_status(ctx: &TestContext) -> Result<()> {
    let admin = ctx.super_admin().await?;
    let jobdesk = karyawan_jobdesk(ctx).await?;
    let resp = ctx
        .put_json_authed(
            &format!("/jobdesks/{}/status", jobdesk.id),
            &admin.token,
            &UpdateJobdeskStatusRequest {
                status: "archived".into(),
            },
        )
        .await?;
    expect_error(resp, 400, "Invalid status").await
}

/// Karyawan DELETE → 403.
pub async fn delete_denied_for_karyawan(ctx: &TestContext) -> Result<()> {
    let karyawan = ctx.karyawan().await?;
    let jobdesk = karyawan_jobdesk(ctx).await?;
    let resp = ctx
        .delete_authed(&format!("/jobdesks/{}", jobdesk.id), &karyawan.token)
        .await?;
    expect_status(resp, 403).await?;
    Ok(())
}

/// Pengurus may edit but not delete → 403, and the jobdesk is still listed.
pub async fn delete_denied_for_pengurus(ctx: &TestContext) -> Result<()> {
    let pengurus = ctx.pengurus().await?;
    let admin = ctx.super_admin().await?;
    let jobdesk = karyawan_jobdesk(ctx).await?;
    let resp = ctx
        .delete_authed(&format!("/jobdesks/{}", jobdesk.id), &pengurus.token)
        .await?;
    expect_status(resp, 403).await?;

    let list = ctx.api.list_jobdesks(&admin.token).await?;
    ensure!(
        list.jobdesks.iter().any(|j| j.id == jobdesk.id),
        "jobdesk gone after a denied delete"
    );
    Ok(())
}

/// No token DELETE → 403.
pub async fn delete_denied_without_token(ctx: &TestContext) -> Result<()> {
    let resp = ctx.delete(&format!("/jobdesks/{}", Uuid::new_v4())).await?;
    expect_status(resp, 403).await?;
    Ok(())
}

/// Unknown id DELETE → 404.
pub async fn delete_unknown_id_not_found(ctx: &TestContext) -> Result<()> {
    let admin = ctx.super_admin().await?;
    let resp = ctx
        .delete_authed(&format!("/jobdesks/{}", Uuid::new_v4()), &admin.token)
        .await?;
    expect_status(resp, 404).await?;
    Ok(())
}

/// DELETE → `deletedJobdeskId`, gone from the list, linked todos lose their `jobdeskId`.
pub async fn delete_detaches_linked_todos(ctx: &TestContext) -> Result<()> {
    let admin = ctx.super_admin().await?;
    let karyawan = ctx.karyawan().await?;
    let jobdesk = karyawan_jobdesk(ctx).await?;

    let todo = ctx
        .create_todo(
            karyawan,
            &fixtures::todo_request(
                "Test Todo for Cascade Delete",
                TodoStatus::Pending,
                Some(&jobdesk.id),
            ),
        )
        .await?;

    let body = ctx
        .api
        .delete_jobdesk(&admin.token, &jobdesk.id)
        .await
        .context("delete failed")?;
    ensure!(
        body.deleted_jobdesk_id == jobdesk.id,
        "expected deletedJobdeskId {}, got {}",
        jobdesk.id,
        body.deleted_jobdesk_id
    );

    let list = ctx.api.list_jobdesks(&admin.token).await?;
    ensure!(
        !list.jobdesks.iter().any(|j| j.id == jobdesk.id),
        "deleted jobdesk still listed"
    );

    let todos = ctx.api.list_todos(&karyawan.token).await?;
    let linked = todos
        .todos
        .iter()
        .find(|t| t.id == todo.id)
        .context("todo should survive its jobdesk")?;
    ensure!(
        linked.jobdesk_id.is_none(),
        "todo still points at deleted jobdesk {:?}",
        linked.jobdesk_id
    );
    Ok(())
}

/// Karyawan only sees jobdesks assigned to them, and one assigned to them is visible.
pub async fn karyawan_sees_assigned_jobdesk(ctx: &TestContext) -> Result<()> {
    let karyawan = ctx.karyawan().await?;
    let jobdesk = karyawan_jobdesk(ctx).await?;

    let list = ctx.api.list_jobdesks(&karyawan.token).await?;
    ensure!(
        list.jobdesks.iter().any(|j| j.id == jobdesk.id),
        "assigned jobdesk not visible to karyawan"
    );
    ensure!(
        list.jobdesks
            .iter()
            .all(|j| j.assigned_to.contains(&karyawan.user_id)),
        "karyawan can see jobdesks not assigned to them"
    );
    Ok(())
}
