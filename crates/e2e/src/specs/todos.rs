use anyhow::{Context, Result, ensure};
use serde_json::json;
use uuid::Uuid;

use deskcheck_api::{
    ConvertToLogRequest, ConvertToLogResponse, Jobdesk, Todo, TodoStatus, converted_notes_prefix,
};

use super::{expect_error, expect_status};
use crate::client::{TestContext, TestUser};
use crate::fixtures;

const HOURS_SPENT: f64 = 4.5;
const HOURS_ERROR: &str = "Hours spent must be greater than 0";

/// Super admin owns a jobdesk assigned to themself and a `done` todo linked to it.
async fn done_todo_with_jobdesk(ctx: &TestContext) -> Result<(&TestUser, Jobdesk, Todo)> {
    let admin = ctx.super_admin().await?;
    let jobdesk = ctx
        .create_jobdesk(&fixtures::jobdesk_request(
            "Test Jobdesk for Todo Conversion",
            vec![admin.user_id.clone()],
        ))
        .await?;
    let todo = ctx
        .create_todo(
            admin,
            &fixtures::todo_request(
                "Complete Project Documentation",
                TodoStatus::Done,
                Some(&jobdesk.id),
            ),
        )
        .await?;
    Ok((admin, jobdesk, todo))
}

fn convert_path(todo_id: &str) -> String {
    format!("/todos/{todo_id}/convert-to-log")
}

/// No token → 401.
pub async fn convert_requires_auth(ctx: &TestContext) -> Result<()> {
    let (_, _, todo) = done_todo_with_jobdesk(ctx).await?;
    let resp = ctx
        .post_json(
            &convert_path(&todo.id),
            &ConvertToLogRequest {
                hours_spent: Some(HOURS_SPENT),
            },
        )
        .await?;
    expect_status(resp, 401).await?;
    Ok(())
}

/// Missing, zero and negative `hoursSpent` → 400 each; the todo stays convertible.
pub async fn convert_validates_hours_spent(ctx: &TestContext) -> Result<()> {
    let (admin, _, todo) = done_todo_with_jobdesk(ctx).await?;

    let cases = [
        ("missing hoursSpent", json!({})),
        ("zero hoursSpent", json!({ "hoursSpent": 0 })),
        ("negative hoursSpent", json!({ "hoursSpent": -2.5 })),
    ];
    for (name, body) in cases {
        let resp = ctx
            .post_json_authed(&convert_path(&todo.id), &admin.token, &body)
            .await?;
        expect_error(resp, 400, HOURS_ERROR)
            .await
            .with_context(|| name.to_string())?;
    }

    ctx.api
        .convert_todo_to_log(&admin.token, &todo.id, HOURS_SPENT)
        .await
        .context("todo should still convert after rejected attempts")?;
    Ok(())
}

/// Unknown todo id → 404 "Todo not found".
pub async fn convert_unknown_todo_not_found(ctx: &TestContext) -> Result<()> {
    let admin = ctx.super_admin().await?;
    let resp = ctx
        .post_json_authed(
            &convert_path(&Uuid::new_v4().to_string()),
            &admin.token,
            &ConvertToLogRequest {
                hours_spent: Some(3.0),
            },
        )
        .await?;
    expect_error(resp, 404, "Todo not found").await
}

/// Todo without a jobdesk → 400.
pub async fn convert_requires_jobdesk(ctx: &TestContext) -> Result<()> {
    let admin = ctx.super_admin().await?;
    let todo = ctx
        .create_todo(
            admin,
            &fixtures::todo_request("Personal Task Without Jobdesk", TodoStatus::Done, None),
        )
        .await?;
    let resp = ctx
        .post_json_authed(
            &convert_path(&todo.id),
            &admin.token,
            &ConvertToLogRequest {
                hours_spent: Some(2.0),
            },
        )
        .await?;
    expect_error(resp, 400, "Todo must have a jobdesk to convert").await
}

/// Pending todo → 400.
pub async fn convert_requires_done_status(ctx: &TestContext) -> Result<()> {
    let (admin, jobdesk, _) = done_todo_with_jobdesk(ctx).await?;
    let pending = ctx
        .create_todo(
            admin,
            &fixtures::todo_request(
                "Pending Task with Jobdesk",
                TodoStatus::Pending,
                Some(&jobdesk.id),
            ),
        )
        .await?;
    let resp = ctx
        .post_json_authed(
            &convert_path(&pending.id),
            &admin.token,
            &ConvertToLogRequest {
                hours_spent: Some(1.5),
            },
        )
        .await?;
    expect_error(resp, 400, "Todo must be in done status to convert").await
}

/// Done todo with jobdesk → 200 with a log carrying user, jobdesk, hours and notes.
pub async fn convert_done_todo_creates_log(ctx: &TestContext) -> Result<()> {
    let (admin, jobdesk, todo) = done_todo_with_jobdesk(ctx).await?;
    let resp = ctx
        .post_json_authed(
            &convert_path(&todo.id),
            &admin.token,
            &ConvertToLogRequest {
                hours_spent: Some(HOURS_SPENT),
            },
        )
        .await?;
    let body: ConvertToLogResponse = expect_status(resp, 200)
        .await?
        .json()
        .await
        .context("expected {message, log}")?;
    let log = body.log;

    ensure!(!body.message.is_empty(), "expected a message");
    ensure!(log.user_id == admin.user_id, "userId mismatch: {}", log.user_id);
    ensure!(log.jobdesk_id == jobdesk.id, "jobdeskId mismatch: {}", log.jobdesk_id);
    ensure!(
        (log.hours_spent - HOURS_SPENT).abs() < f64::EPSILON,
        "hoursSpent mismatch: {}",
        log.hours_spent
    );
    let prefix = converted_notes_prefix(&todo.title);
    ensure!(
        log.notes.starts_with(&prefix),
        "notes should start with {prefix:?}, got {:?}",
        log.notes
    );
    Ok(())
}

/// Converting the same todo twice → 400 "Todo already converted to log".
pub async fn convert_twice_rejected(ctx: &TestContext) -> Result<()> {
    let (admin, _, todo) = done_todo_with_jobdesk(ctx).await?;
    ctx.api
        .convert_todo_to_log(&admin.token, &todo.id, HOURS_SPENT)
        .await
        .context("first conversion failed")?;

    let resp = ctx
        .post_json_authed(
            &convert_path(&todo.id),
            &admin.token,
            &ConvertToLogRequest {
                hours_spent: Some(2.0),
            },
        )
        .await?;
    expect_error(resp, 400, "Todo already converted to log").await
}

/// The new log shows up in GET /api/daily-logs and the todo reports `convertedToLog`.
pub async fn converted_log_is_listed(ctx: &TestContext) -> Result<()> {
    let (admin, jobdesk, todo) = done_todo_with_jobdesk(ctx).await?;
    let converted = ctx
        .api
        .convert_todo_to_log(&admin.token, &todo.id, HOURS_SPENT)
        .await?;

    let logs = ctx.api.list_daily_logs(&admin.token).await?;
    let listed = logs
        .logs
        .iter()
        .find(|l| l.id == converted.log.id)
        .context("converted log missing from /daily-logs")?;
    ensure!(listed.jobdesk_id == jobdesk.id);
    ensure!(listed.is_from_todo(), "listed log lacks the To-Do marker");

    let todos = ctx.api.list_todos(&admin.token).await?;
    let flagged = todos
        .todos
        .iter()
        .find(|t| t.id == todo.id)
        .context("converted todo missing from /todos")?;
    ensure!(flagged.converted_to_log, "convertedToLog flag not set");
    Ok(())
}

/// The `convertedToLog` flag is persisted in the todos collection.
pub async fn converted_flag_persisted(ctx: &TestContext) -> Result<()> {
    let store = ctx.require_store()?;
    let (admin, _, todo) = done_todo_with_jobdesk(ctx).await?;

    ensure!(
        store.todo_converted(&todo.id).await? == Some(false),
        "fresh todo should not be flagged"
    );
    ctx.api
        .convert_todo_to_log(&admin.token, &todo.id, HOURS_SPENT)
        .await?;
    ensure!(
        store.todo_converted(&todo.id).await? == Some(true),
        "convertedToLog not persisted"
    );
    Ok(())
}
