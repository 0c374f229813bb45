//! End-to-end tests through the `fanfetch` binary: the isolated-process
//! strategy (which needs the binary as its worker), strategy equivalence,
//! console output and exit codes.

#[allow(dead_code)]
#[path = "../../fanfetch-core/tests/common/static_server.rs"]
mod static_server;

use std::path::Path;
use std::process::{Command, Output};

use fanfetch_core::sink::Sink;
use fanfetch_core::{
    resolve_targets, run, ExecutorConfig, FailureKind, Outcome, RunContext, Strategy, TargetSource,
    WorkerCommand,
};
use static_server::Route;
use tempfile::{tempdir, TempDir};

const BIN: &str = env!("CARGO_BIN_EXE_fanfetch");

fn body(seed: u8, len: usize) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(17).wrapping_add(seed)).collect()
}

fn dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Runs the binary with config and log dirs isolated in `home`.
fn fanfetch(home: &TempDir, args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_STATE_HOME", home.path().join("state"))
        .output()
        .expect("run fanfetch")
}

fn isolated() -> ExecutorConfig {
    ExecutorConfig::new(Strategy::IsolatedProcess).with_worker(WorkerCommand::fanfetch_binary(BIN))
}

#[test]
fn isolated_process_writes_identical_files_in_order() {
    let payloads: Vec<Vec<u8>> = (0..4).map(|i| body(i, 2048 * (i as usize + 1))).collect();
    let server = static_server::start(
        payloads
            .iter()
            .enumerate()
            .map(|(i, p)| Route::ok(&format!("/p/{i}.jpg"), p.clone()))
            .collect(),
    );
    let locators: Vec<String> = (0..4).map(|i| server.url(&format!("/p/{i}.jpg"))).collect();
    let targets = resolve_targets(Some(&locators), &TargetSource::without_defaults()).unwrap();

    let out = tempdir().unwrap();
    let report = run(&targets, &isolated(), RunContext::new(Sink::new(out.path())));
    assert_eq!(report.results.len(), 4);
    assert_eq!(report.succeeded(), 4, "{:?}", report.results);
    for (i, r) in report.results.iter().enumerate() {
        assert_eq!(r.target, targets[i]);
        assert_eq!(std::fs::read(out.path().join(format!("{i}.jpg"))).unwrap(), payloads[i]);
    }
    assert!(report.total_duration >= report.max_unit_duration());
}

#[test]
fn isolated_process_failure_stays_per_unit() {
    let server = static_server::start(vec![Route::ok("/a/one.jpg", b"one".to_vec())]);
    let locators = vec![
        server.url("/a/one.jpg"),
        "http://127.0.0.1:1/b/two.jpg".to_string(),
        server.url("/c/gone.jpg"),
    ];
    let targets = resolve_targets(Some(&locators), &TargetSource::without_defaults()).unwrap();

    let out = tempdir().unwrap();
    let report = run(&targets, &isolated(), RunContext::new(Sink::new(out.path())));
    assert!(report.results[0].is_success());
    // The worker ran and reported a fetch failure; this is not a worker failure.
    assert!(matches!(report.results[1].outcome, Outcome::Failure { kind: FailureKind::Fetch, .. }));
    match &report.results[2].outcome {
        Outcome::Failure { reason, .. } => assert_eq!(reason, "HTTP 404"),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(dir_names(out.path()), ["one.jpg"]);
}

#[test]
fn isolated_process_collision_leaves_one_file() {
    let first = body(1, 32 * 1024);
    let second = body(2, 16 * 1024);
    let server = static_server::start(vec![
        Route::ok("/p/x.jpg", first.clone()),
        Route::ok("/q/x.jpg", second.clone()),
    ]);
    let locators = vec![server.url("/p/x.jpg"), server.url("/q/x.jpg")];
    let targets = resolve_targets(Some(&locators), &TargetSource::without_defaults()).unwrap();

    let out = tempdir().unwrap();
    let report = run(&targets, &isolated(), RunContext::new(Sink::new(out.path())));
    assert_eq!(report.succeeded(), 2);
    assert_eq!(dir_names(out.path()), ["x.jpg"]);
    let written = std::fs::read(out.path().join("x.jpg")).unwrap();
    assert!(written == first || written == second);
}

#[test]
fn every_strategy_prints_a_line_per_unit_and_a_total() {
    let server = static_server::start(vec![
        Route::ok("/a/one.jpg", body(1, 500)),
        Route::ok("/b/two.jpg", body(2, 700)),
    ]);
    let one = server.url("/a/one.jpg");
    let two = server.url("/b/two.jpg");

    for strategy in Strategy::ALL {
        let home = tempdir().unwrap();
        let out = tempdir().unwrap();
        let output = fanfetch(
            &home,
            &[
                "run",
                "--strategy",
                strategy.name(),
                "-o",
                out.path().to_str().unwrap(),
                "-l",
                &one,
                &two,
            ],
        );
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(output.status.success(), "{strategy}: {stdout} {}", String::from_utf8_lossy(&output.stderr));
        let lines: Vec<&str> = stdout.lines().collect();
        assert_eq!(lines.len(), 3, "{strategy}: {stdout}");
        assert!(lines.iter().any(|l| l.starts_with("one.jpg: ") && l.ends_with('s')));
        assert!(lines.iter().any(|l| l.starts_with("two.jpg: ")));
        assert!(lines[2].starts_with("Total: "), "{strategy}: {stdout}");
        assert_eq!(dir_names(out.path()), ["one.jpg", "two.jpg"]);
        assert_eq!(std::fs::read(out.path().join("two.jpg")).unwrap(), body(2, 700));
    }
}

#[test]
fn failed_units_still_exit_zero() {
    let home = tempdir().unwrap();
    let out = tempdir().unwrap();
    let output = fanfetch(
        &home,
        &["-o", out.path().to_str().unwrap(), "-l", "http://127.0.0.1:1/dead.jpg"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("dead.jpg: failed after"), "{stdout}");
    assert!(dir_names(out.path()).is_empty());
}

#[test]
fn json_report_is_machine_readable() {
    let server = static_server::start(vec![Route::ok("/j/pic.jpg", body(9, 321))]);
    let home = tempdir().unwrap();
    let out = tempdir().unwrap();
    let output = fanfetch(
        &home,
        &[
            "--json",
            "--strategy",
            "parallel-worker",
            "-o",
            out.path().to_str().unwrap(),
            "-l",
            &server.url("/j/pic.jpg"),
        ],
    );
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["strategy"], "parallel-worker");
    assert_eq!(report["results"][0]["byte_length"], 321);
    assert_eq!(report["results"][0]["outcome"]["status"], "success");
    assert!(report["total_duration"].as_f64().unwrap() >= 0.0);
}

#[test]
fn unknown_strategy_fails_before_dispatch() {
    let server = static_server::start(vec![Route::ok("/a.jpg", body(1, 10))]);
    let home = tempdir().unwrap();
    let out = tempdir().unwrap();
    let output = fanfetch(
        &home,
        &["--strategy", "green-threads", "-o", out.path().to_str().unwrap(), "-l", &server.url("/a.jpg")],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("green-threads"));
    assert!(dir_names(out.path()).is_empty());
    assert_eq!(server.hits(), 0);
}

#[test]
fn malformed_locator_fails_before_dispatch() {
    let home = tempdir().unwrap();
    let out = tempdir().unwrap();
    let output = fanfetch(&home, &["-o", out.path().to_str().unwrap(), "-l", "not-a-url"]);
    assert!(!output.status.success());
    assert!(dir_names(out.path()).is_empty());
}

#[test]
fn empty_default_list_is_a_config_error() {
    let home = tempdir().unwrap();
    let config_dir = home.path().join("config").join("fanfetch");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        "default_targets = []\nconnect_timeout_secs = 5\ntimeout_secs = 10\n",
    )
    .unwrap();
    let out = tempdir().unwrap();
    let output = fanfetch(&home, &["-o", out.path().to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no targets"));
    assert!(dir_names(out.path()).is_empty());
}

#[test]
fn fetch_one_rejects_malformed_request() {
    let home = tempdir().unwrap();
    let output = fanfetch(&home, &["fetch-one", "{not json"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn completions_are_generated() {
    let home = tempdir().unwrap();
    let output = fanfetch(&home, &["completions", "bash"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("fanfetch"));
}

#[test]
fn bench_compares_all_strategies() {
    let server = static_server::start(vec![Route::ok("/b/x.jpg", body(3, 1000))]);
    let home = tempdir().unwrap();
    let output = fanfetch(&home, &["bench", "-l", &server.url("/b/x.jpg")]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    for strategy in Strategy::ALL {
        assert!(stdout.contains(strategy.name()), "{stdout}");
    }
    assert!(stdout.contains("Recommended strategy: "));
}
