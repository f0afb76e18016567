use std::sync::Arc;
use std::time::Duration;

use liveclass_core::{SessionDescription, SessionHandle};
use liveclass_session::{PollKind, Polled, Poller, SessionEvent};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::integration::init_tracing;
use crate::utils::{MockRelay, TEST_POLL_MS};

fn poller(relay: &MockRelay, parent: &CancellationToken) -> (Poller, mpsc::Receiver<SessionEvent>) {
    let (tx, rx) = mpsc::channel(64);
    let poller = Poller::new(
        Arc::new(relay.clone()),
        SessionHandle::new("class-1"),
        Duration::from_millis(TEST_POLL_MS),
        tx,
        parent.clone(),
    );
    (poller, rx)
}

async fn next_polled(rx: &mut mpsc::Receiver<SessionEvent>) -> Polled {
    match tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
        Ok(Some(SessionEvent::Polled(p))) => p,
        other => panic!("expected a poll result, got {other:?}"),
    }
}

#[tokio::test]
async fn test_poller_forwards_empty_ticks() {
    init_tracing();

    let relay = MockRelay::new();
    let parent = CancellationToken::new();
    let (poller, mut rx) = poller(&relay, &parent);

    let handle = poller.spawn(PollKind::Offer);
    assert_eq!(handle.kind(), PollKind::Offer);
    assert_eq!(next_polled(&mut rx).await, Polled::Offer(None));

    let offer = SessionDescription::offer("v=0");
    relay.set_offer(offer.clone());
    loop {
        if next_polled(&mut rx).await == Polled::Offer(Some(offer.clone())) {
            break;
        }
    }
    handle.cancel();
}

#[tokio::test]
async fn test_poller_stops_after_cancel() {
    init_tracing();

    let relay = MockRelay::new();
    let parent = CancellationToken::new();
    let (poller, mut rx) = poller(&relay, &parent);

    let handles = poller.spawn_all();
    assert_eq!(handles.len(), 3);
    for _ in 0..6 {
        next_polled(&mut rx).await;
    }

    parent.cancel();
    assert!(handles.iter().all(|h| h.is_cancelled()));
    tokio::time::sleep(Duration::from_millis(TEST_POLL_MS * 2)).await;
    while rx.try_recv().is_ok() {}

    let fetches = relay.candidate_fetches();
    tokio::time::sleep(Duration::from_millis(TEST_POLL_MS * 5)).await;
    assert!(rx.try_recv().is_err(), "cancelled loop still forwarding");
    assert_eq!(relay.candidate_fetches(), fetches);
    assert!(handles.iter().all(|h| h.is_finished()));
}

#[tokio::test]
async fn test_transient_failures_keep_polling() {
    init_tracing();

    let relay = MockRelay::new();
    relay.set_fail_fetches(true);
    let parent = CancellationToken::new();
    let (poller, mut rx) = poller(&relay, &parent);
    let handle = poller.spawn(PollKind::Candidates);

    tokio::time::sleep(Duration::from_millis(TEST_POLL_MS * 4)).await;
    assert!(rx.try_recv().is_err());
    assert!(!handle.is_finished());

    relay.set_fail_fetches(false);
    assert_eq!(next_polled(&mut rx).await, Polled::Candidates(vec![]));
    handle.cancel();
}
