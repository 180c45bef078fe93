//! Termination by real process signals.
//!
//! Kept in its own test binary: raising SIGTERM reaches every waiter in the
//! process, so nothing else may be waiting here.
#![cfg(unix)]

use nix::sys::signal::{raise, Signal};
use std::future::Future;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

use service_orchestrator::lifecycle::{Shutdown, SignalOutcome, SignalTrap, TermSignal};
use service_orchestrator::{Phase, Service};

/// Raise `sig` until `waiting` finishes. The waiter installs its handler when
/// first polled, so a single early raise could be missed.
async fn raise_until<F: Future>(sig: Signal, waiting: F) -> F::Output {
    tokio::pin!(waiting);
    let mut ticker = tokio::time::interval(Duration::from_millis(50));
    let deadline = tokio::time::sleep(Duration::from_secs(5));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            output = &mut waiting => return output,
            _ = ticker.tick() => raise(sig).unwrap(),
            _ = &mut deadline => panic!("{sig:?} was not observed"),
        }
    }
}

#[tokio::test]
async fn termination_signals_end_the_wait() {
    // Replace the default disposition first so an early raise cannot kill the
    // test process.
    let _term_guard = signal(SignalKind::terminate()).unwrap();
    let _int_guard = signal(SignalKind::interrupt()).unwrap();

    let cancel = CancellationToken::new();

    let trap = SignalTrap::new(Shutdown::new().subscribe());
    let outcome = raise_until(Signal::SIGTERM, trap.wait(&cancel)).await;
    assert!(matches!(outcome, SignalOutcome::Terminated(TermSignal::Terminate)));

    let trap = SignalTrap::new(Shutdown::new().subscribe());
    let outcome = raise_until(Signal::SIGINT, trap.wait(&cancel)).await;
    assert!(matches!(outcome, SignalOutcome::Terminated(TermSignal::Interrupt)));

    // The same path drives a running service into draining.
    let service = Service::new(CancellationToken::new(), "orders", Vec::new()).unwrap();
    raise_until(Signal::SIGTERM, service.start()).await.unwrap();
    assert_eq!(service.phase(), Phase::Draining);

    service.stop().await;
    assert_eq!(service.phase(), Phase::Stopped);
}
