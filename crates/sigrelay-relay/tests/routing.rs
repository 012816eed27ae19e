//! Registry and router property tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use axum::extract::ws::Message;
use serde_json::Value;
use tokio::sync::mpsc;

use sigrelay_core::protocol::Envelope;
use sigrelay_relay::relay::{ClientRegistry, Connection, RegistrationGuard, SignalRouter};

fn setup() -> (Arc<ClientRegistry>, SignalRouter) {
    let registry = Arc::new(ClientRegistry::new());
    let router = SignalRouter::new(Arc::clone(&registry), 200);
    (registry, router)
}

fn connect(registry: &ClientRegistry, id: &str) -> (u64, mpsc::Receiver<Message>) {
    let (tx, rx) = mpsc::channel(8);
    let (conn_seq, displaced) = registry.register(id.to_string(), Connection { tx });
    assert!(displaced.is_none(), "unexpected displaced binding for {id}");
    (conn_seq, rx)
}

fn recv_json(rx: &mut mpsc::Receiver<Message>) -> Value {
    match rx.try_recv().expect("expected a queued frame") {
        Message::Text(s) => serde_json::from_str(&s).unwrap(),
        other => panic!("expected text frame, got {other:?}"),
    }
}

fn env(raw: &str) -> Envelope {
    Envelope::parse(raw).unwrap()
}

#[test]
fn registry_tracks_exactly_the_bound_ids() {
    let registry = ClientRegistry::new();
    assert!(registry.is_empty());

    let (tx, _rx_a) = mpsc::channel(1);
    registry.register("a".into(), Connection { tx });
    let (tx, _rx_b) = mpsc::channel(1);
    registry.register("b".into(), Connection { tx });

    assert_eq!(registry.len(), 2);
    assert!(registry.contains("a"));
    assert!(registry.contains("b"));
    assert!(!registry.contains("ghost"));
    assert!(registry.get("a").is_some());
    assert!(registry.get("ghost").is_none());
}

#[tokio::test]
async fn reregistering_an_id_replaces_the_binding() {
    let (registry, router) = setup();
    let (_seq, mut rx_old) = connect(&registry, "a");

    let (tx, mut rx_new) = mpsc::channel(8);
    let (_seq2, displaced) = registry.register("a".into(), Connection { tx });
    assert!(displaced.is_some());
    assert_eq!(registry.len(), 1);

    assert!(router.send_to("a", &env(r#"{"type":"offer","sdp":"x"}"#)).await);
    assert_eq!(recv_json(&mut rx_new)["type"], "offer");
    assert!(rx_old.try_recv().is_err(), "old binding must receive nothing");
}

#[test]
fn stale_unregister_does_not_evict_replacement() {
    let registry = ClientRegistry::new();
    let (tx, _rx1) = mpsc::channel(1);
    let (seq1, _) = registry.register("a".into(), Connection { tx });
    let (tx, _rx2) = mpsc::channel(1);
    let (seq2, displaced) = registry.register("a".into(), Connection { tx });
    assert!(displaced.is_some());

    // superseded session's cleanup runs after the replacement registered
    assert!(!registry.unregister("a", seq1));
    assert!(registry.contains("a"));

    assert!(registry.unregister("a", seq2));
    assert!(!registry.contains("a"));
}

#[test]
fn unregister_twice_is_a_noop() {
    let registry = ClientRegistry::new();
    let (tx, _rx) = mpsc::channel(1);
    let (seq, _) = registry.register("a".into(), Connection { tx });

    assert!(registry.unregister("a", seq));
    assert!(!registry.unregister("a", seq));
    assert!(!registry.unregister("never-registered", 99));
}

#[test]
fn guard_unregisters_on_drop() {
    let registry = Arc::new(ClientRegistry::new());
    let (tx, _rx) = mpsc::channel(1);
    let (seq, _) = registry.register("a".into(), Connection { tx });

    {
        let _guard = RegistrationGuard::new(Arc::clone(&registry), "a".into(), seq);
        assert!(registry.contains("a"));
    }
    assert!(!registry.contains("a"));
}

#[tokio::test]
async fn send_to_unknown_target_fails_without_side_effects() {
    let (registry, router) = setup();
    let (_seq, mut rx_b) = connect(&registry, "b");

    assert!(!router.send_to("ghost", &env(r#"{"type":"offer"}"#)).await);
    assert!(rx_b.try_recv().is_err());
}

#[tokio::test]
async fn unicast_scenario_offer_is_stamped_and_delivered() {
    let (registry, router) = setup();
    let (_sa, mut rx_a) = connect(&registry, "A");
    let (_sb, mut rx_b) = connect(&registry, "B");

    router
        .handle_message("A", env(r#"{"type":"offer","target_id":"B","sdp":"v=0"}"#))
        .await;

    let got = recv_json(&mut rx_b);
    assert_eq!(got["type"], "offer");
    assert_eq!(got["target_id"], "B");
    assert_eq!(got["sdp"], "v=0");
    assert_eq!(got["from"], "A");
    assert!(rx_a.try_recv().is_err());
}

#[tokio::test]
async fn from_stamp_overwrites_client_supplied_value() {
    let (registry, router) = setup();
    let (_sa, _rx_a) = connect(&registry, "A");
    let (_sb, mut rx_b) = connect(&registry, "B");

    router
        .handle_message(
            "A",
            env(r#"{"type":"answer","target_id":"B","from":"someone-else"}"#),
        )
        .await;

    assert_eq!(recv_json(&mut rx_b)["from"], "A");
}

#[tokio::test]
async fn broadcast_reaches_everyone_but_the_sender() {
    let (registry, router) = setup();
    let (_sa, mut rx_a) = connect(&registry, "A");
    let (_sb, mut rx_b) = connect(&registry, "B");
    let (_sc, mut rx_c) = connect(&registry, "C");

    router.handle_message("A", env(r#"{"type":"ping"}"#)).await;

    for rx in [&mut rx_b, &mut rx_c] {
        let got = recv_json(rx);
        assert_eq!(got["type"], "ping");
        assert_eq!(got["from"], "A");
    }
    assert!(rx_a.try_recv().is_err(), "sender must not hear its own broadcast");
}

#[tokio::test]
async fn broadcast_failures_are_isolated_per_recipient() {
    let (registry, router) = setup();
    let (_sa, _rx_a) = connect(&registry, "A");
    let (_sb, rx_b) = connect(&registry, "B");
    let (_sc, mut rx_c) = connect(&registry, "C");

    // B's receive side is gone; delivery to C must still happen
    drop(rx_b);
    router.handle_message("A", env(r#"{"type":"ping"}"#)).await;

    assert_eq!(recv_json(&mut rx_c)["from"], "A");
}

#[tokio::test]
async fn abrupt_disconnect_fails_sends_without_affecting_others() {
    let (registry, router) = setup();
    let (_sa, rx_a) = connect(&registry, "A");
    let (_sb, mut rx_b) = connect(&registry, "B");

    drop(rx_a); // A vanished without unregistering yet

    assert!(!router.send_to("A", &env(r#"{"type":"offer"}"#)).await);
    assert!(router.send_to("B", &env(r#"{"type":"offer"}"#)).await);
    assert_eq!(recv_json(&mut rx_b)["type"], "offer");
}

#[tokio::test]
async fn empty_target_id_is_a_broadcast() {
    let (registry, router) = setup();
    let (_sa, _rx_a) = connect(&registry, "A");
    let (_sb, mut rx_b) = connect(&registry, "B");

    router
        .handle_message("A", env(r#"{"type":"ping","target_id":""}"#))
        .await;

    assert_eq!(recv_json(&mut rx_b)["from"], "A");
}

#[tokio::test(start_paused = true)]
async fn stalled_peer_queue_times_out_as_failure() {
    let registry = Arc::new(ClientRegistry::new());
    let router = SignalRouter::new(Arc::clone(&registry), 100);

    let (tx, mut rx) = mpsc::channel(1);
    registry.register("slow".into(), Connection { tx });

    // fill the queue; the receiver is alive but not draining
    assert!(router.send_to("slow", &env(r#"{"type":"ping"}"#)).await);
    assert!(!router.send_to("slow", &env(r#"{"type":"ping"}"#)).await);

    // the stale binding stays until the owning session cleans up
    assert!(registry.contains("slow"));
    let _ = rx.try_recv();
}
