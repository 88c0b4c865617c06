//! Test harness - iterates test cases and compares outputs
//!
//! Evaluation is strictly sequential and never aborts early: a timeout or
//! spawn failure on one test case yields a failed result for that case and
//! the remaining cases still run. Result order always matches test-case
//! order, so callers can zip results back to their definitions by index.

use std::time::Duration;

use tracing::debug;

use crate::judge::{ExecutionResult, TestCase};
use crate::languages::LanguageSpec;
use crate::runner::{CommandSpec, Runner};
use crate::workspace::Workspace;

/// Run the submission once per test case and assemble the result set.
pub async fn evaluate(
    runner: &dyn Runner,
    spec: &LanguageSpec,
    workspace: &Workspace,
    tests: &[TestCase],
    deadline: Duration,
) -> Vec<ExecutionResult> {
    let cmd = CommandSpec::from_vec(&spec.run_command);
    let mut results = Vec::with_capacity(tests.len());

    for (idx, test) in tests.iter().enumerate() {
        let run = runner
            .run(&cmd, workspace.path(), test.input.as_bytes(), deadline)
            .await;

        let result = match run {
            Ok(outcome) => {
                // Trim is applied symmetrically; no other normalization.
                let actual = outcome.stdout.trim().to_string();
                let expected = test.output.trim().to_string();
                let passed = actual == expected;
                ExecutionResult {
                    input: test.input.clone(),
                    expected,
                    actual,
                    passed,
                    error: (!outcome.stderr.is_empty()).then(|| outcome.stderr),
                    time_ms: Some(outcome.time_ms),
                }
            }
            // Partial output from a killed process is discarded; the result
            // carries an explicit error instead.
            Err(e) => ExecutionResult {
                input: test.input.clone(),
                expected: test.output.trim().to_string(),
                actual: String::new(),
                passed: false,
                error: Some(e.to_string()),
                time_ms: None,
            },
        };

        debug!(
            "Testcase {}/{}: passed={}",
            idx + 1,
            tests.len(),
            result.passed
        );
        results.push(result);
    }

    results
}
