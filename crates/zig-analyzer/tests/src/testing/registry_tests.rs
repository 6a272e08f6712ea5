use super::*;

fn sh(script: &str) -> Vec<String> {
    vec!["-c".to_string(), script.to_string()]
}

#[tokio::test]
async fn passing_run_resolves_true_with_success_banner() {
    let registry = TestRunRegistry::new();
    let handle = registry.spawn("/bin/sh", &sh("echo all good; exit 0"), None, false).unwrap();

    assert!(handle.await.unwrap());
    assert_eq!(registry.live_count(), 0);

    let output = registry.output().snapshot();
    assert!(output.iter().any(|line| line.contains("all good")));
    assert_eq!(output.iter().filter(|line| *line == "Success: tests passed.").count(), 1);
}

#[tokio::test]
async fn failing_run_resolves_false_with_error_banner() {
    let registry = TestRunRegistry::new();
    let handle = registry.spawn("/bin/sh", &sh("exit 2"), None, false).unwrap();

    assert!(!handle.await.unwrap());
    assert_eq!(registry.live_count(), 0);

    let output = registry.output().snapshot();
    assert_eq!(output.iter().filter(|line| *line == "Error: tests failed.").count(), 1);
}

#[tokio::test]
async fn stderr_lines_reach_the_sink() {
    let registry = TestRunRegistry::new();
    let handle = registry.spawn("/bin/sh", &sh("echo oops >&2; exit 1"), None, false).unwrap();

    assert!(!handle.await.unwrap());
    let output = registry.output().snapshot();
    assert!(output.iter().any(|line| line.contains("oops")));
}

#[tokio::test]
async fn cancel_all_empties_the_set_and_reports_cancelled() {
    let registry = TestRunRegistry::new();
    let handles: Vec<_> = (0..3)
        .map(|_| registry.spawn("sleep", &["10".to_string()], None, false).unwrap())
        .collect();
    assert_eq!(registry.live_count(), 3);

    registry.cancel_all().await;
    assert_eq!(registry.live_count(), 0);

    for handle in handles {
        assert!(!handle.await.unwrap());
    }
    let output = registry.output().snapshot();
    assert_eq!(
        output.iter().filter(|line| *line == "Error: tests terminated by user.").count(),
        3,
    );
}

#[tokio::test]
async fn cancel_all_is_idempotent_on_an_empty_set() {
    let registry = TestRunRegistry::new();
    registry.cancel_all().await;
    registry.cancel_all().await;
    assert_eq!(registry.live_count(), 0);
}

#[tokio::test]
async fn missing_runner_reports_spawn_error_without_phantom_entry() {
    let registry = TestRunRegistry::new();
    let error = registry
        .spawn("zig-analyzer-no-such-test-runner", &["test".to_string()], None, false)
        .unwrap_err();

    assert!(matches!(error, SpawnError::CommandNotFound(_)));
    assert_eq!(registry.live_count(), 0);
    assert!(registry.output().snapshot().is_empty(), "no header for a run that never started");
}

#[tokio::test]
async fn output_survives_while_another_run_is_live() {
    let registry = TestRunRegistry::new();
    let long = registry.spawn("sleep", &["10".to_string()], None, false).unwrap();
    let quick = registry.spawn("/bin/sh", &sh("exit 0"), None, false).unwrap();

    assert!(quick.await.unwrap());
    let output = registry.output().snapshot();
    assert!(
        output.iter().any(|line| line.contains("Running tool: sleep 10")),
        "live run's header must not be cleared by a later spawn"
    );

    registry.cancel_all().await;
    assert!(!long.await.unwrap());
}

#[tokio::test]
async fn output_clears_once_everything_finished() {
    let registry = TestRunRegistry::new();
    let first = registry.spawn("/bin/sh", &sh("echo first; exit 0"), None, false).unwrap();
    assert!(first.await.unwrap());

    let second = registry.spawn("/bin/sh", &sh("echo second; exit 0"), None, false).unwrap();
    assert!(second.await.unwrap());

    let output = registry.output().snapshot();
    assert!(!output.iter().any(|line| line.contains("first")));
    assert!(output.iter().any(|line| line.contains("second")));
}

#[tokio::test]
async fn live_watch_flips_back_when_the_last_run_finishes() {
    let registry = TestRunRegistry::new();
    let mut live = registry.watch_live();
    assert!(!*live.borrow());

    let handle = registry.spawn("/bin/sh", &sh("exit 0"), None, false).unwrap();
    assert!(*registry.watch_live().borrow());

    assert!(handle.await.unwrap());
    live.wait_for(|is_live| !*is_live).await.unwrap();
    assert_eq!(registry.live_count(), 0);
}

#[tokio::test]
async fn background_runs_do_not_request_reveal() {
    let registry = TestRunRegistry::new();
    let reveal = registry.output().watch_reveal();

    let background = registry.spawn("/bin/sh", &sh("exit 0"), None, true).unwrap();
    assert!(background.await.unwrap());
    assert_eq!(*reveal.borrow(), 0);

    let foreground = registry.spawn("/bin/sh", &sh("exit 0"), None, false).unwrap();
    assert!(foreground.await.unwrap());
    assert_eq!(*reveal.borrow(), 1);
}
