pub mod auth;
pub mod jobdesks;
pub mod passwords;
pub mod pwa;
pub mod todos;

use anyhow::{Context, Result, bail, ensure};

use deskcheck_api::ErrorResponse;

/// Fail unless `resp` has status `expected`; the body is included in the error.
pub(crate) async fn expect_status(
    resp: reqwest::Response,
    expected: u16,
) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.as_u16() != expected {
        let body = resp.text().await.unwrap_or_default();
        bail!("expected {expected}, got {status}: {body}");
    }
    Ok(resp)
}

/// Fail unless `resp` has status `expected` and its `error` field contains `fragment`.
pub(crate) async fn expect_error(
    resp: reqwest::Response,
    expected: u16,
    fragment: &str,
) -> Result<()> {
    let resp = expect_status(resp, expected).await?;
    let body: ErrorResponse = resp.json().await.context("error body is not JSON")?;
    ensure!(
        body.error.contains(fragment),
        "expected error containing {fragment:?}, got {:?}",
        body.error
    );
    Ok(())
}
