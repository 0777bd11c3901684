//! Orchestrator behavior end to end: init ordering, health gating, triggers and teardown.

use std::time::{Duration, Instant};

use hrapp::admin::HealthState;
use hrapp::lifecycle::{
    LifecycleError, LifecycleState, Orchestrator, OrchestratorHandle, OsSignal, ShutdownTrigger,
};
use hrapp::Command;
use tokio::task::JoinHandle;

mod common;
use common::{health_status, test_config, MockService, RunBehavior, WAIT_TIMEOUT};

type Run = JoinHandle<Result<(), LifecycleError>>;

fn start(orchestrator: Orchestrator) -> (OrchestratorHandle, Run) {
    let handle = orchestrator.handle();
    (handle, tokio::spawn(orchestrator.run()))
}

async fn finish(run: Run) -> Result<(), LifecycleError> {
    tokio::time::timeout(WAIT_TIMEOUT, run)
        .await
        .expect("orchestrator did not return")
        .expect("orchestrator task panicked")
}

#[tokio::test]
async fn health_turns_on_after_warmup_and_off_at_shutdown() {
    let mut config = test_config();
    config.lifecycle.warmup_ms = 1000;
    let (service, probe) = MockService::new("svc");
    let (mut handle, run) = start(Orchestrator::builder(config).service(service).build());

    handle.wait_for(LifecycleState::RunningNotReady).await;
    let admin = handle.admin_addr().expect("admin bound");
    assert_eq!(health_status(admin).await, Some(503));
    assert_eq!(probe.inits(), 1);

    assert_eq!(handle.wait_for(LifecycleState::RunningReady).await, LifecycleState::RunningReady);
    assert_eq!(health_status(admin).await, Some(200));
    assert_eq!(probe.runs_started(), 1);
    assert!(probe.readiness_checks() >= 1, "readiness is reported when health flips");
    assert!(handle.is_running());

    handle.shutdown();
    finish(run).await.expect("clean shutdown");

    assert_eq!(probe.shutdowns(), 1);
    assert_eq!(probe.runs_returned(), 1);
    assert_eq!(handle.state(), LifecycleState::Stopped);
    assert!(!handle.is_running());
    assert_eq!(handle.health().state(), HealthState::Draining);
    assert_eq!(health_status(admin).await, None, "admin listener must be closed");
}

#[tokio::test]
async fn stuck_shutdown_command_is_bounded_by_grace() {
    let (stuck, stuck_probe) = MockService::new("stuck");
    let stuck = stuck.command_delay(Duration::from_secs(3600));
    let (prompt, prompt_probe) = MockService::new("prompt");
    let orchestrator = Orchestrator::builder(test_config())
        .service(stuck)
        .service(prompt)
        .build();
    let (mut handle, run) = start(orchestrator);

    handle.wait_for(LifecycleState::RunningReady).await;
    let admin = handle.admin_addr().unwrap();

    let started = Instant::now();
    handle.shutdown();
    let err = finish(run).await.unwrap_err();
    assert!(started.elapsed() < WAIT_TIMEOUT);

    match &err {
        LifecycleError::ShutdownFault { remaining, .. } => {
            assert_eq!(remaining, &vec!["stuck".to_string()])
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_ne!(err.exit_code(), 0);
    assert_eq!(stuck_probe.shutdowns(), 0);
    assert_eq!(prompt_probe.shutdowns(), 1);
    assert_eq!(prompt_probe.runs_returned(), 1);
    assert_eq!(handle.state(), LifecycleState::Stopped);
    assert_eq!(health_status(admin).await, None, "admin listener must be closed");
}

#[tokio::test]
async fn health_reports_unavailable_before_services_finish_stopping() {
    let (service, probe) = MockService::new("slow");
    let service = service.command_delay(Duration::from_millis(500));
    let (mut handle, run) = start(Orchestrator::builder(test_config()).service(service).build());

    handle.wait_for(LifecycleState::RunningReady).await;
    let admin = handle.admin_addr().unwrap();

    handle.trigger(ShutdownTrigger::Signal(OsSignal::Terminate));
    handle.wait_for(LifecycleState::ShuttingDown).await;

    assert!(!handle.health().is_healthy());
    assert_eq!(health_status(admin).await, Some(503));
    assert_eq!(probe.runs_returned(), 0, "service should still be draining");

    finish(run).await.expect("clean shutdown");
    assert_eq!(probe.runs_returned(), 1);
}

#[tokio::test]
async fn init_failure_starts_nothing() {
    let (first, first_probe) = MockService::new("first");
    let (bad, bad_probe) = MockService::new("bad");
    let (never, never_probe) = MockService::new("never");
    let orchestrator = Orchestrator::builder(test_config())
        .service(first)
        .service(bad.failing_init())
        .service(never)
        .build();
    let (handle, run) = start(orchestrator);

    let err = finish(run).await.unwrap_err();
    match &err {
        LifecycleError::ServiceInit { service, .. } => assert_eq!(service, "bad"),
        other => panic!("unexpected error: {other}"),
    }
    assert_ne!(err.exit_code(), 0);

    assert_eq!(first_probe.inits(), 1);
    assert_eq!(bad_probe.inits(), 1);
    assert_eq!(never_probe.inits(), 0, "init stops at the first failure");
    assert_eq!(first_probe.runs_started(), 0);
    assert_eq!(handle.health().state(), HealthState::NotReady);
    assert_eq!(handle.state(), LifecycleState::Stopped);

    let admin = handle.admin_addr().expect("admin was bound during init");
    assert_eq!(health_status(admin).await, None, "admin must never serve");
}

#[tokio::test]
async fn admin_bind_failure_is_fatal() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = test_config();
    config.admin.listen_address = taken.local_addr().unwrap().to_string();

    let (service, probe) = MockService::new("svc");
    let (_handle, run) = start(Orchestrator::builder(config).service(service).build());

    let err = finish(run).await.unwrap_err();
    assert!(matches!(err, LifecycleError::AdminInit(_)), "{err}");
    assert_eq!(probe.inits(), 0);
}

#[tokio::test]
async fn admin_failure_takes_the_shutdown_path() {
    let (service, probe) = MockService::new("svc");
    let (mut handle, run) = start(Orchestrator::builder(test_config()).service(service).build());

    handle.wait_for(LifecycleState::RunningReady).await;
    handle.trigger(ShutdownTrigger::AdminFailure("accept loop died".to_string()));

    let err = finish(run).await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::AdminFailure(ref reason) if reason == "accept loop died"
    ));
    assert_ne!(err.exit_code(), 0);
    assert_eq!(probe.shutdowns(), 1);
    assert_eq!(probe.runs_returned(), 1);
    assert!(!handle.health().is_healthy());
}

#[tokio::test]
async fn concurrent_triggers_run_one_shutdown() {
    let (a, probe_a) = MockService::new("a");
    let (b, probe_b) = MockService::new("b");
    let orchestrator = Orchestrator::builder(test_config())
        .service(a)
        .service(b)
        .build();
    let (mut handle, run) = start(orchestrator);

    handle.wait_for(LifecycleState::RunningReady).await;

    let mut senders = Vec::new();
    for i in 0..8 {
        let handle = handle.clone();
        senders.push(tokio::spawn(async move {
            if i % 2 == 0 {
                handle.trigger(ShutdownTrigger::Signal(OsSignal::Terminate));
            } else {
                handle.trigger(ShutdownTrigger::InternalStop {
                    source: format!("racer-{i}"),
                });
            }
        }));
    }
    for sender in senders {
        sender.await.unwrap();
    }

    finish(run).await.expect("clean shutdown");
    assert_eq!(probe_a.shutdowns(), 1);
    assert_eq!(probe_b.shutdowns(), 1);
    assert!(handle.is_shutting_down());
}

#[tokio::test]
async fn hangup_does_not_shut_down() {
    let (service, probe) = MockService::new("svc");
    let (mut handle, run) = start(Orchestrator::builder(test_config()).service(service).build());

    handle.wait_for(LifecycleState::RunningReady).await;
    handle.trigger(ShutdownTrigger::Signal(OsSignal::Hangup));
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(handle.state(), LifecycleState::RunningReady);
    assert!(handle.health().is_healthy());
    assert_eq!(probe.shutdowns(), 0);

    handle.trigger(ShutdownTrigger::Signal(OsSignal::Interrupt));
    finish(run).await.expect("clean shutdown");
    assert_eq!(probe.shutdowns(), 1);
}

#[tokio::test]
async fn service_exit_stops_everyone() {
    let (quitter, quitter_probe) = MockService::new("quitter");
    let quitter = quitter.behavior(RunBehavior::ExitAfter(Duration::from_millis(400)));
    let (steady, steady_probe) = MockService::new("steady");
    let (_handle, run) = start(
        Orchestrator::builder(test_config())
            .service(quitter)
            .service(steady)
            .build(),
    );

    finish(run).await.expect("an orderly exit is a clean shutdown");
    assert_eq!(quitter_probe.runs_returned(), 1);
    assert_eq!(steady_probe.shutdowns(), 1);
    assert_eq!(steady_probe.runs_returned(), 1);
}

#[tokio::test]
async fn service_failure_exits_non_zero() {
    let (broken, _) = MockService::new("broken");
    let broken = broken.behavior(RunBehavior::FailAfter(Duration::from_millis(300)));
    let (steady, steady_probe) = MockService::new("steady");
    let (_handle, run) = start(
        Orchestrator::builder(test_config())
            .service(broken)
            .service(steady)
            .build(),
    );

    let err = finish(run).await.unwrap_err();
    match &err {
        LifecycleError::ServiceFault { service, .. } => assert_eq!(service, "broken"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(steady_probe.shutdowns(), 1);
}

#[tokio::test]
async fn service_ignoring_shutdown_is_aborted_after_grace() {
    let (stubborn, probe) = MockService::new("stubborn");
    let stubborn = stubborn.behavior(RunBehavior::IgnoreShutdown);
    let (polite, polite_probe) = MockService::new("polite");
    let (mut handle, run) = start(
        Orchestrator::builder(test_config())
            .service(stubborn)
            .service(polite)
            .build(),
    );

    handle.wait_for(LifecycleState::RunningReady).await;
    let started = Instant::now();
    handle.shutdown();

    let err = finish(run).await.unwrap_err();
    match &err {
        LifecycleError::ShutdownFault { remaining, .. } => {
            assert_eq!(remaining, &vec!["stubborn".to_string()])
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_ne!(err.exit_code(), 0);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(probe.shutdowns(), 1);
    assert_eq!(probe.runs_returned(), 0);
    assert_eq!(polite_probe.runs_returned(), 1);
}

#[tokio::test]
async fn trigger_during_warmup_never_reports_healthy() {
    let mut config = test_config();
    config.lifecycle.warmup_ms = 10_000;
    let (service, probe) = MockService::new("svc");
    let (mut handle, run) = start(Orchestrator::builder(config).service(service).build());

    handle.wait_for(LifecycleState::RunningNotReady).await;
    handle.shutdown();

    finish(run).await.expect("clean shutdown");
    assert_eq!(handle.health().state(), HealthState::Draining);
    assert_eq!(probe.shutdowns(), 1);
}

#[tokio::test]
async fn unknown_commands_are_ignored() {
    let (service, probe) = MockService::new("svc");
    use hrapp::HostedService;

    service.handle_command(Command::new("RELOAD")).await.unwrap();
    assert_eq!(probe.other_commands(), 1);
    assert!(service.readiness());
}
