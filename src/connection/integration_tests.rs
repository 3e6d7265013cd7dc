//! Connection manager driven by a scripted connector on tokio's paused clock.

use futures_util::future::{self, BoxFuture};
use futures_util::stream;
use futures_util::{FutureExt, StreamExt};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::connection_manager::ConnectionManager;
use super::events::{ConnectionEvent, Subscription};
use super::state::{ConnectionState, Phase, RetryPolicy};
use super::transport::{Connector, FrameStream, TcpLineConnector};
use crate::error_handling::types::{ParseError, TransportError};

/// What one connection attempt does.
pub(crate) enum Script {
    Refuse(String),
    /// Never completes the handshake.
    Hang,
    /// Delivers the frames, then the peer closes.
    Frames(Vec<String>),
    /// Delivers the frames and stays open.
    Open(Vec<String>),
    /// Delivers whatever the test sends; closes when the sender is dropped.
    Feed(mpsc::UnboundedReceiver<String>),
}

/// Connector replaying one [`Script`] per attempt; refuses once the scripts
/// run out.
pub(crate) struct ScriptedConnector {
    scripts: Mutex<VecDeque<Script>>,
    attempts: AtomicUsize,
}

impl ScriptedConnector {
    pub(crate) fn new(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            attempts: AtomicUsize::new(0),
        })
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Connector for ScriptedConnector {
    fn connect(&self) -> BoxFuture<'_, Result<FrameStream, TransportError>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.lock().pop_front();
        async move {
            match script {
                None => Err(TransportError::ConnectFailed(String::from("connection refused"))),
                Some(Script::Refuse(reason)) => Err(TransportError::ConnectFailed(reason)),
                Some(Script::Hang) => future::pending().await,
                Some(Script::Frames(frames)) => Ok(stream::iter(frames.into_iter().map(Ok)).boxed()),
                Some(Script::Open(frames)) => Ok(stream::iter(frames.into_iter().map(Ok))
                    .chain(stream::pending())
                    .boxed()),
                Some(Script::Feed(rx)) => Ok(stream::unfold(rx, |mut rx| async move {
                    rx.recv().await.map(|frame| (Ok(frame), rx))
                })
                .boxed()),
            }
        }
        .boxed()
    }

    fn describe(&self) -> String {
        String::from("scripted")
    }
}

pub(crate) fn policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 5,
        delay: Duration::from_secs(3),
    }
}

async fn next_status(sub: &mut Subscription) -> ConnectionState {
    loop {
        match sub.recv().await {
            Some(ConnectionEvent::StatusChanged(state)) => return state,
            Some(_) => continue,
            None => panic!("event bus closed"),
        }
    }
}

async fn wait_for(sub: &mut Subscription, phase: Phase) -> ConnectionState {
    loop {
        let state = next_status(sub).await;
        if state.phase == phase {
            return state;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_max_retries() {
    let connector = ScriptedConnector::new(Vec::new());
    let mut manager = ConnectionManager::new(connector.clone(), policy());
    let mut sub = manager.subscribe();

    manager.start();

    let mut seen = Vec::new();
    loop {
        let state = next_status(&mut sub).await;
        assert!(state.retries <= 5);
        seen.push(state.phase);
        if state.phase == Phase::Failed {
            break;
        }
    }

    assert_eq!(connector.attempts(), 5);
    assert_eq!(seen.iter().filter(|p| **p == Phase::Reconnecting).count(), 4);

    let status = manager.status();
    assert!(!status.connected);
    assert!(status.reason.unwrap().contains("connection refused"));

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(connector.attempts(), 5);
    assert_eq!(manager.state().phase, Phase::Failed);
}

#[tokio::test(start_paused = true)]
async fn reconnect_waits_for_the_fixed_delay() {
    let connector = ScriptedConnector::new(vec![Script::Refuse("down".into()), Script::Hang]);
    let mut manager = ConnectionManager::new(connector.clone(), policy());
    let mut sub = manager.subscribe();

    manager.start();
    wait_for(&mut sub, Phase::Reconnecting).await;
    let lost_at = tokio::time::Instant::now();

    wait_for(&mut sub, Phase::Connecting).await;
    assert_eq!(lost_at.elapsed(), Duration::from_secs(3));
    assert_eq!(manager.state().retries, 1);

    manager.stop().await;
}

#[tokio::test(start_paused = true)]
async fn successful_connection_resets_retry_counter() {
    let connector = ScriptedConnector::new(vec![
        Script::Refuse("down".into()),
        Script::Refuse("down".into()),
        Script::Frames(vec![String::from(r#"{"type":"network_stats","data":{}}"#)]),
        Script::Hang,
    ]);
    let mut manager = ConnectionManager::new(connector.clone(), policy());
    let mut sub = manager.subscribe();

    manager.start();

    let before = wait_for(&mut sub, Phase::Reconnecting).await;
    assert_eq!(before.retries, 1);
    let before = wait_for(&mut sub, Phase::Reconnecting).await;
    assert_eq!(before.retries, 2);

    let connected = wait_for(&mut sub, Phase::Connected).await;
    assert_eq!(connected.retries, 0);

    let after = wait_for(&mut sub, Phase::Reconnecting).await;
    assert_eq!(after.retries, 1);
    assert_eq!(after.last_error.as_deref(), Some("Connection closed by peer"));

    manager.stop().await;
}

#[tokio::test(start_paused = true)]
async fn malformed_message_is_reported_and_connection_survives() {
    let connector = ScriptedConnector::new(vec![Script::Open(vec![
        String::from("{not json"),
        String::from(r#"{"type":"new_packet","data":{"src_ip":"10.0.0.1"}}"#),
    ])]);
    let mut manager = ConnectionManager::new(connector.clone(), policy());
    let mut sub = manager.subscribe();

    manager.start();
    wait_for(&mut sub, Phase::Connected).await;

    assert!(matches!(
        sub.recv().await,
        Some(ConnectionEvent::Error(ParseError::Malformed(_)))
    ));
    match sub.recv().await {
        Some(ConnectionEvent::Message(value)) => assert_eq!(value["type"], "new_packet"),
        other => panic!("unexpected event {:?}", other),
    }

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(manager.state().phase, Phase::Connected);
    assert_eq!(connector.attempts(), 1);

    manager.stop().await;
}

#[tokio::test(start_paused = true)]
async fn stop_while_connecting_leaves_nothing_running() {
    let connector = ScriptedConnector::new(vec![Script::Hang]);
    let mut manager = ConnectionManager::new(connector.clone(), policy());
    let mut sub = manager.subscribe();

    manager.start();
    tokio::task::yield_now().await;
    assert_eq!(connector.attempts(), 1);

    manager.stop().await;
    assert_eq!(manager.state(), ConnectionState::default());
    assert_eq!(wait_for(&mut sub, Phase::Disconnected).await.retries, 0);

    // Only the test and the manager still hold the connector.
    assert_eq!(Arc::strong_count(&connector), 2);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(connector.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_during_reconnect_wait_cancels_the_timer() {
    let connector = ScriptedConnector::new(Vec::new());
    let mut manager = ConnectionManager::new(connector.clone(), policy());
    let mut sub = manager.subscribe();

    manager.start();
    wait_for(&mut sub, Phase::Reconnecting).await;
    manager.stop().await;

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(connector.attempts(), 1);
    assert_eq!(manager.state().phase, Phase::Disconnected);
    assert_eq!(Arc::strong_count(&connector), 2);
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent() {
    let connector = ScriptedConnector::new(vec![Script::Open(Vec::new())]);
    let mut manager = ConnectionManager::new(connector.clone(), policy());

    manager.stop().await;
    manager.start();
    manager.stop().await;
    manager.stop().await;
    assert_eq!(manager.state().phase, Phase::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn start_after_failure_begins_a_fresh_cycle() {
    let connector = ScriptedConnector::new(Vec::new());
    let mut manager = ConnectionManager::new(
        connector.clone(),
        RetryPolicy { max_retries: 2, ..policy() },
    );
    let mut sub = manager.subscribe();

    manager.start();
    wait_for(&mut sub, Phase::Failed).await;
    assert_eq!(connector.attempts(), 2);

    manager.start();
    let restarted = next_status(&mut sub).await;
    assert_eq!((restarted.phase, restarted.retries), (Phase::Connecting, 0));
    wait_for(&mut sub, Phase::Failed).await;
    assert_eq!(connector.attempts(), 4);
}

#[tokio::test(start_paused = true)]
async fn second_start_while_running_is_ignored() {
    let (tx, rx) = mpsc::unbounded_channel();
    let connector = ScriptedConnector::new(vec![Script::Feed(rx)]);
    let mut manager = ConnectionManager::new(connector.clone(), policy());
    let mut sub = manager.subscribe();

    manager.start();
    wait_for(&mut sub, Phase::Connected).await;
    manager.start();

    tx.send(String::from(r#"{"type":"new_alert","data":{}}"#)).unwrap();
    assert!(matches!(sub.recv().await, Some(ConnectionEvent::Message(_))));
    assert_eq!(connector.attempts(), 1);

    manager.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn start_right_after_failure_is_never_ignored() {
    let connector = ScriptedConnector::new(Vec::new());
    let mut manager = ConnectionManager::new(
        connector.clone(),
        RetryPolicy {
            max_retries: 1,
            delay: Duration::ZERO,
        },
    );
    let mut sub = manager.subscribe();

    for round in 1..=20 {
        manager.start();
        let state = tokio::time::timeout(Duration::from_secs(5), wait_for(&mut sub, Phase::Failed))
            .await
            .unwrap_or_else(|_| panic!("round {} never reached Failed", round));
        assert_eq!(state.retries, 1);
    }
    assert_eq!(connector.attempts(), 20);
}

#[tokio::test]
async fn undecodable_tcp_line_is_reported_without_reconnecting() {
    use tokio::io::AsyncWriteExt;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket
            .write_all(b"\xff\xfe garbage\n{\"type\":\"new_packet\",\"data\":{}}\n")
            .await
            .unwrap();
        let _ = done_rx.await;
    });

    let mut manager = ConnectionManager::new(Arc::new(TcpLineConnector::new(&addr)), policy());
    let mut sub = manager.subscribe();
    manager.start();

    let events = tokio::time::timeout(Duration::from_secs(5), async {
        wait_for(&mut sub, Phase::Connected).await;
        (sub.recv().await, sub.recv().await)
    })
    .await
    .unwrap();

    assert!(matches!(
        events.0,
        Some(ConnectionEvent::Error(ParseError::Malformed(_)))
    ));
    match events.1 {
        Some(ConnectionEvent::Message(value)) => assert_eq!(value["type"], "new_packet"),
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(manager.state().phase, Phase::Connected);
    assert_eq!(manager.state().retries, 0);

    manager.stop().await;
    let _ = done_tx.send(());
}
