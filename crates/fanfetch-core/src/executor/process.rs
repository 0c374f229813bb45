//! Isolated-process dispatch: each unit runs in its own child process.
//!
//! Children are supervised from the shared thread pool, one blocking
//! `Command::output` per pool thread, so `max_in_flight` bounds live children.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use crate::error::FetchError;
use crate::report::{FetchResult, Outcome};
use crate::strategy::WorkerCommand;
use crate::targets::FetchTarget;
use crate::worker::{WorkerReport, WorkerRequest};

use super::{pool, Indexed, RunContext};

pub(super) fn dispatch(
    targets: &[FetchTarget],
    in_flight: usize,
    worker: &WorkerCommand,
    ctx: &RunContext,
) -> Indexed {
    let (program, args) = match worker.resolve() {
        Ok(cmd) => cmd,
        Err(e) => {
            tracing::error!("cannot resolve worker program: {}", e);
            let err = FetchError::Worker(format!("cannot resolve worker program: {e}"));
            return targets
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    let result = FetchResult::failure(t, Outcome::from(&err), Default::default(), 1);
                    ctx.notify(&result);
                    (i, result)
                })
                .collect();
        }
    };
    tracing::debug!(program = %program.display(), "isolated-process worker program");
    pool::run_pool(targets, in_flight, ctx, |t| run_child(&program, &args, t, ctx))
}

fn run_child(program: &Path, args: &[OsString], target: &FetchTarget, ctx: &RunContext) -> FetchResult {
    let started = Instant::now();
    match spawn_and_wait(program, args, target, ctx) {
        Ok(report) => {
            let duration = started.elapsed();
            tracing::debug!(
                locator = target.locator(),
                child_secs = report.duration_secs,
                "worker reported"
            );
            if report.outcome.is_success() {
                FetchResult::success(target, report.byte_length, duration, report.attempts)
            } else {
                FetchResult::failure(target, report.outcome, duration, report.attempts)
            }
        }
        Err(e) => {
            tracing::warn!(locator = target.locator(), "worker failed: {}", e);
            FetchResult::failure(target, Outcome::from(&e), started.elapsed(), 1)
        }
    }
}

fn spawn_and_wait(
    program: &Path,
    args: &[OsString],
    target: &FetchTarget,
    ctx: &RunContext,
) -> Result<WorkerReport, FetchError> {
    let request = WorkerRequest {
        target: target.clone(),
        output_dir: absolute_dir(ctx.sink().dir()),
        fetch: ctx.fetch_options().clone(),
        retry: ctx.retry().copied(),
    };
    let json = serde_json::to_string(&request)
        .map_err(|e| FetchError::Worker(format!("encode request: {e}")))?;

    let output = Command::new(program)
        .args(args)
        .arg(json)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| FetchError::Worker(format!("spawn {}: {e}", program.display())))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(FetchError::Worker(format!(
            "worker exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    parse_report(&output.stdout)
}

/// The report is the last non-empty stdout line.
fn parse_report(stdout: &[u8]) -> Result<WorkerReport, FetchError> {
    let text = String::from_utf8_lossy(stdout);
    let line = text
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| FetchError::Worker("worker printed no report".to_string()))?;
    serde_json::from_str(line).map_err(|e| FetchError::Worker(format!("unreadable worker report: {e}")))
}

/// Children may not share our working directory semantics; hand them an
/// absolute path.
fn absolute_dir(dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        return dir.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(dir))
        .unwrap_or_else(|_| dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::FailureKind;
    use crate::sink::Sink;

    fn target() -> FetchTarget {
        FetchTarget::parse("https://example.com/a/one.jpg", 0).unwrap()
    }

    #[test]
    fn parse_report_takes_last_line() {
        let out = b"noise\n{\"destination_name\":\"one.jpg\",\"byte_length\":4,\"attempts\":1,\"outcome\":{\"status\":\"success\"},\"duration_secs\":0.1}\n\n";
        let report = parse_report(out).unwrap();
        assert_eq!(report.byte_length, 4);
        assert!(matches!(parse_report(b""), Err(FetchError::Worker(_))));
        assert!(matches!(parse_report(b"{oops"), Err(FetchError::Worker(_))));
    }

    #[test]
    fn missing_program_is_worker_failure() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::new(Sink::new(dir.path()));
        let worker = WorkerCommand::Program {
            program: dir.path().join("no-such-binary"),
            args: vec![],
        };
        let out = dispatch(&[target()], 1, &worker, &ctx);
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0].1.outcome, Outcome::Failure { kind: FailureKind::Worker, .. }));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_worker_failure() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::new(Sink::new(dir.path()));
        let worker = WorkerCommand::Program {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".into(), "echo bad >&2; exit 3".into(), "sh".into()],
        };
        let out = dispatch(&[target()], 1, &worker, &ctx);
        match &out[0].1.outcome {
            Outcome::Failure { kind: FailureKind::Worker, reason } => assert!(reason.contains("bad")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn relative_dir_is_made_absolute() {
        assert!(absolute_dir(Path::new("out")).is_absolute());
        assert_eq!(absolute_dir(Path::new("/srv/x")), PathBuf::from("/srv/x"));
    }
}
