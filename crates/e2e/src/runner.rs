use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::client::TestContext;
use crate::specs;

/// Returned by a check that cannot run against the current target
/// (e.g. it needs the database and none is configured).
#[derive(Debug, thiserror::Error)]
#[error("skipped: {reason}")]
pub struct Skipped {
    pub reason: String,
}

impl Skipped {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

/// Result of running a single check.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TestResult {
    pub name: String,
    pub outcome: Outcome,
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
    pub error: Option<String>,
}

impl TestResult {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Aggregated results of a full run.
#[derive(Debug, Default, serde::Serialize)]
pub struct TestSuite {
    pub results: Vec<TestResult>,
}

impl TestSuite {
    fn count(&self, outcome: Outcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn passed(&self) -> usize {
        self.count(Outcome::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::Failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(Outcome::Skipped)
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// True when nothing failed. Skips do not count against the run.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Optional substring filter on check names.
    pub filter: Option<String>,
    /// Also run password-changing checks (after everything else, one at a time).
    pub include_destructive: bool,
    /// Checks in flight at once for the non-destructive batch.
    pub concurrency: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            filter: None,
            include_destructive: false,
            concurrency: 1,
        }
    }
}

/// Map a check's return value to an outcome.
pub fn classify(result: anyhow::Result<()>) -> (Outcome, Option<String>) {
    match result {
        Ok(()) => (Outcome::Passed, None),
        Err(e) => match e.downcast_ref::<Skipped>() {
            Some(skip) => (Outcome::Skipped, Some(skip.reason.clone())),
            None => (Outcome::Failed, Some(format!("{e:#}"))),
        },
    }
}

fn matches(filter: Option<&str>, name: &str) -> bool {
    filter.is_none_or(|f| name.contains(f))
}

/// Names of every registered check, in registration order.
pub fn spec_names(include_destructive: bool) -> Vec<&'static str> {
    let mut names = Vec::new();
    macro_rules! push_name {
        ($module:ident :: $name:ident) => {
            names.push(concat!(stringify!($module), "::", stringify!($name)));
        };
    }
    crate::for_each_spec!(push_name);
    if include_destructive {
        crate::for_each_destructive_spec!(push_name);
    }
    names
}

/// Run the registered checks.
///
/// Non-destructive checks run with at most `opts.concurrency` in flight;
/// destructive ones follow strictly one at a time so that no other check
/// logs in while an account's password is changed.
pub async fn run_all(ctx: Arc<TestContext>, opts: &RunOptions) -> TestSuite {
    let filter = opts.filter.as_deref();
    let mut set = JoinSet::new();
    let permits = Arc::new(Semaphore::new(opts.concurrency.max(1)));

    macro_rules! spawn_spec {
        ($module:ident :: $name:ident) => {
            let spec_name = concat!(stringify!($module), "::", stringify!($name));
            if matches(filter, spec_name) {
                let ctx = ctx.clone();
                let permits = permits.clone();
                set.spawn(async move {
                    let _permit = permits.acquire_owned().await.ok();
                    let start = Instant::now();
                    let result = specs::$module::$name(&ctx).await;
                    let duration = start.elapsed();
                    let (outcome, error) = classify(result);
                    TestResult {
                        name: spec_name.to_string(),
                        outcome,
                        duration,
                        error,
                    }
                });
            }
        };
    }

    crate::for_each_spec!(spawn_spec);

    let mut results = Vec::new();
    while let Some(result) = set.join_next().await {
        results.push(join_result(result));
    }
    results.sort_by(|a, b| a.name.cmp(&b.name));

    if opts.include_destructive {
        let mut destructive = Vec::new();
        macro_rules! run_spec {
            ($module:ident :: $name:ident) => {
                let spec_name = concat!(stringify!($module), "::", stringify!($name));
                if matches(filter, spec_name) {
                    let start = Instant::now();
                    let result = specs::$module::$name(&ctx).await;
                    let duration = start.elapsed();
                    let (outcome, error) = classify(result);
                    destructive.push(TestResult {
                        name: spec_name.to_string(),
                        outcome,
                        duration,
                        error,
                    });
                }
            };
        }
        crate::for_each_destructive_spec!(run_spec);
        results.extend(destructive);
    }

    TestSuite { results }
}

fn join_result(result: Result<TestResult, tokio::task::JoinError>) -> TestResult {
    match result {
        Ok(r) => r,
        Err(e) => TestResult {
            name: "unknown (join error)".into(),
            outcome: Outcome::Failed,
            duration: Duration::ZERO,
            error: Some(format!("{e:#}")),
        },
    }
}
