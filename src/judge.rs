//! Execution orchestrator
//!
//! `Judge` owns the full lifecycle of one submission: resolve the language,
//! allocate a workspace, write the source, run the optional build step, and
//! delegate to the harness. Workspace teardown is scoped, so it fires
//! exactly once on every exit path.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::JudgeConfig;
use crate::error::JudgeError;
use crate::harness;
use crate::languages::{LanguageSpec, LanguageTable};
use crate::runner::{CommandSpec, DirectRunner, RunStatus, Runner};
use crate::workspace::Workspace;

/// One grading request: language tag, source text, ordered test cases
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub language: String,
    pub code: String,
    pub test_cases: Vec<TestCase>,
}

/// One stdin-input/expected-stdout pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub output: String,
}

/// Outcome of running a submission against one test case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub input: String,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_ms: Option<u32>,
}

impl ExecutionResult {
    /// Single synthetic result standing in for a whole submission
    /// (build failure and the like).
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            input: String::new(),
            expected: String::new(),
            actual: String::new(),
            passed: false,
            error: Some(error.into()),
            time_ms: None,
        }
    }
}

/// Grades submissions; shared across requests.
///
/// The semaphore bounds how many submissions are in flight process-wide,
/// capping child-process fan-out. Within one submission, test cases run
/// strictly sequentially, so at most one child process per submission is
/// alive at any instant.
pub struct Judge {
    languages: LanguageTable,
    runner: Box<dyn Runner>,
    config: JudgeConfig,
    permits: Semaphore,
}

impl Judge {
    pub fn new(languages: LanguageTable, config: JudgeConfig) -> Self {
        Self::with_runner(languages, config, Box::new(DirectRunner))
    }

    /// Swap in a different runner, e.g. one that routes spawns through an
    /// external sandbox.
    pub fn with_runner(
        languages: LanguageTable,
        config: JudgeConfig,
        runner: Box<dyn Runner>,
    ) -> Self {
        let permits = Semaphore::new(config.max_concurrent.max(1));
        Self {
            languages,
            runner,
            config,
            permits,
        }
    }

    /// Grade one submission.
    ///
    /// Returns one `ExecutionResult` per test case in submission order,
    /// except on build failure (exactly one synthetic result). An unknown
    /// language tag is the sole result-less failure and short-circuits
    /// before any filesystem or process work.
    pub async fn execute(&self, submission: &Submission) -> Result<Vec<ExecutionResult>> {
        let spec = self.languages.resolve(&submission.language)?;

        // Admission control: cap submissions in flight across the service
        let _permit = self
            .permits
            .acquire()
            .await
            .context("Judge is shutting down")?;

        let workspace = Workspace::create()?;
        info!(
            "Grading submission {}: language={}, testcases={}",
            workspace.id(),
            submission.language,
            submission.test_cases.len()
        );

        let results = self.grade(spec, &workspace, submission).await;
        // Explicit destroy logs removal failures; the drop guard still
        // covers panic paths.
        workspace.destroy();
        results
    }

    async fn grade(
        &self,
        spec: &LanguageSpec,
        workspace: &Workspace,
        submission: &Submission,
    ) -> Result<Vec<ExecutionResult>> {
        workspace
            .write_file(&spec.source_file, submission.code.as_bytes())
            .context("Failed to write source file")?;

        if let Some(compile_cmd) = &spec.compile_command {
            let cmd = CommandSpec::from_vec(compile_cmd);
            let build = self
                .runner
                .run(&cmd, workspace.path(), b"", self.config.build_deadline())
                .await;

            match build {
                Ok(outcome) if outcome.is_success() => {}
                Ok(outcome) => {
                    warn!(
                        "Build failed for submission {}: {:?}",
                        workspace.id(),
                        outcome.status
                    );
                    return Ok(vec![ExecutionResult::failure(build_diagnostics(outcome))]);
                }
                Err(JudgeError::Timeout(_)) => {
                    return Ok(vec![ExecutionResult::failure("compilation timed out")]);
                }
                Err(e) => {
                    return Ok(vec![ExecutionResult::failure(e.to_string())]);
                }
            }
        }

        Ok(harness::evaluate(
            self.runner.as_ref(),
            spec,
            workspace,
            &submission.test_cases,
            self.config.run_deadline(),
        )
        .await)
    }
}

fn build_diagnostics(outcome: crate::runner::RunOutcome) -> String {
    if !outcome.stderr.is_empty() {
        outcome.stderr
    } else if !outcome.stdout.is_empty() {
        outcome.stdout
    } else {
        match outcome.status {
            RunStatus::Exited(code) => format!("compilation failed with exit code {}", code),
            RunStatus::Signaled(sig) => format!("compiler killed by signal {}", sig),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::{Duration, Instant};

    fn sh_table() -> LanguageTable {
        LanguageTable::from_toml(
            r#"
[shell]
source_file = "main.sh"
run_command = "sh main.sh"

[shell-built]
source_file = "main.sh"
compile_command = "sh -c true"
run_command = "sh main.sh"

[shell-broken-build]
source_file = "main.sh"
compile_command = "sh -c no_such_build_tool_xyz"
run_command = "sh main.sh"

[shell-slow-build]
source_file = "main.sh"
compile_command = "sleep 30"
run_command = "sh main.sh"
"#,
        )
        .unwrap()
    }

    fn judge_with(config: JudgeConfig) -> Judge {
        Judge::new(sh_table(), config)
    }

    fn submission(language: &str, code: &str, tests: &[(&str, &str)]) -> Submission {
        Submission {
            language: language.into(),
            code: code.into(),
            test_cases: tests
                .iter()
                .map(|(input, output)| TestCase {
                    input: (*input).into(),
                    output: (*output).into(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_interpreted_submission_passes() {
        let judge = judge_with(JudgeConfig::default());
        let sub = submission("shell", "read a\nread b\necho $((a + b))\n", &[("2\n3", "5")]);
        let results = judge.execute(&sub).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].passed);
        assert_eq!(results[0].actual, "5");
    }

    #[tokio::test]
    async fn test_build_step_runs_before_tests() {
        let judge = judge_with(JudgeConfig::default());
        let sub = submission("shell-built", "echo hi\n", &[("", "hi")]);
        let results = judge.execute(&sub).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].passed);
    }

    #[tokio::test]
    async fn test_build_failure_yields_single_result_and_skips_tests() {
        let judge = judge_with(JudgeConfig::default());
        let sub = submission("shell-broken-build", "echo hi\n", &[("", "hi"), ("", "hi")]);
        let results = judge.execute(&sub).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(!results[0].passed);
        let error = results[0].error.as_deref().unwrap();
        assert!(!error.is_empty());
    }

    #[tokio::test]
    async fn test_build_timeout_yields_single_failed_result() {
        let config = JudgeConfig {
            build_timeout_ms: 300,
            ..JudgeConfig::default()
        };
        let judge = judge_with(config);
        let sub = submission("shell-slow-build", "echo hi\n", &[("", "hi"), ("", "hi")]);
        let results = judge.execute(&sub).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(!results[0].passed);
        assert!(results[0].error.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_unsupported_language_is_a_resultless_failure() {
        let judge = judge_with(JudgeConfig::default());
        let sub = submission("ruby", "puts 1", &[("", "1")]);
        let err = judge.execute(&sub).await.unwrap_err();
        let judge_err = err.downcast_ref::<JudgeError>().unwrap();
        assert!(matches!(
            judge_err,
            JudgeError::UnsupportedLanguage(tag) if tag == "ruby"
        ));
    }

    #[tokio::test]
    async fn test_workspace_is_gone_after_execute() {
        let judge = judge_with(JudgeConfig::default());
        let marker = tempfile::NamedTempFile::new().unwrap();
        let code = format!("pwd > {}\necho done\n", marker.path().display());
        let sub = submission("shell", &code, &[("", "done")]);

        let results = judge.execute(&sub).await.unwrap();
        assert!(results[0].passed);

        let workspace_dir = std::fs::read_to_string(marker.path()).unwrap();
        let workspace_dir = workspace_dir.trim();
        assert!(!workspace_dir.is_empty());
        assert!(!Path::new(workspace_dir).exists());
    }

    #[tokio::test]
    async fn test_same_submission_grades_the_same_twice() {
        let judge = judge_with(JudgeConfig::default());
        let sub = submission(
            "shell",
            "read x\necho $x\n",
            &[("a", "a"), ("b", "WRONG"), ("c", "c")],
        );
        let first: Vec<bool> = judge
            .execute(&sub)
            .await
            .unwrap()
            .iter()
            .map(|r| r.passed)
            .collect();
        let second: Vec<bool> = judge
            .execute(&sub)
            .await
            .unwrap()
            .iter()
            .map(|r| r.passed)
            .collect();
        assert_eq!(first, vec![true, false, true]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_admission_control_serializes_submissions() {
        let config = JudgeConfig {
            max_concurrent: 1,
            ..JudgeConfig::default()
        };
        let judge = judge_with(config);
        let sub = submission("shell", "sleep 0.5\necho ok\n", &[("", "ok")]);

        let started = Instant::now();
        let (a, b) = tokio::join!(judge.execute(&sub), judge.execute(&sub));
        assert!(a.unwrap()[0].passed);
        assert!(b.unwrap()[0].passed);
        // With a single permit the two half-second runs cannot overlap
        assert!(started.elapsed() >= Duration::from_millis(900));
    }
}
