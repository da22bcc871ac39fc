//! Integration tests for the miner pipeline
//!
//! Covers the flow from event submission through rebuild and broadcast to
//! subscriber channels, without the HTTP layer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use process_miner::config::PipelineConfig;
use process_miner::discovery::{DirectlyFollowsMiner, DiscoveryEngine, DiscoveryError};
use process_miner::error::MinerError;
use process_miner::persistence::MemoryEventStore;
use process_miner::pipeline::{MinerService, RebuildOutcome, Subscription};
use process_miner::types::{Event, Snapshot, UpdateKind, WireMessage};

fn event(log: &str, secs: i64, activity: &str) -> Event {
    Event::new(log, Utc.timestamp_opt(secs, 0).unwrap(), activity, "case-1")
}

fn service_with(engine: Arc<dyn DiscoveryEngine>) -> MinerService {
    MinerService::new(
        PipelineConfig::default(),
        engine,
        Arc::new(MemoryEventStore::new()),
    )
}

async fn rebuild_all(service: &MinerService) {
    for handle in service.rebuild_scheduler().tick() {
        handle.await.unwrap();
    }
}

async fn next_message(sub: &mut Subscription) -> WireMessage {
    let text = tokio::time::timeout(Duration::from_secs(1), sub.receiver.recv())
        .await
        .expect("no message within a second")
        .expect("subscription closed");
    serde_json::from_str(&text).unwrap()
}

fn fixed_model(_log: &str, _events: &[Event]) -> Result<Snapshot, DiscoveryError> {
    let mut snapshot = Snapshot::new();
    snapshot.add_place("p1");
    snapshot.add_place("p2");
    snapshot.add_transition("t1");
    snapshot.add_edge("p1", "t1");
    Ok(snapshot)
}

struct CountingEngine {
    calls: AtomicUsize,
}

impl DiscoveryEngine for CountingEngine {
    fn discover(&self, log: &str, events: &[Event]) -> Result<Snapshot, DiscoveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        DirectlyFollowsMiner::new().discover(log, events)
    }
}

#[tokio::test]
async fn test_end_to_end_late_subscriber_gets_full_state() {
    let service = service_with(Arc::new(DirectlyFollowsMiner::new()));
    service.submit_event(event("L", 1, "A")).await.unwrap();
    service.submit_event(event("L", 2, "B")).await.unwrap();

    rebuild_all(&service).await;
    let miner = service.registry().get("L").unwrap();
    assert_eq!(miner.pending_updates(), 1);

    let mut sub = service.connect("L").unwrap();
    let msg = next_message(&mut sub).await;
    assert_eq!(msg.kind, UpdateKind::Full);
    assert_eq!(msg.update.tenant, "L");

    let transitions: Vec<_> = msg
        .update
        .new_transitions
        .iter()
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(transitions, vec!["A", "B"]);
    assert!(msg.update.removed_places.is_empty());
    assert!(msg.update.removed_transitions.is_empty());
    assert!(msg.update.removed_edges.is_empty());
}

#[tokio::test]
async fn test_new_subscriber_receives_model_before_any_broadcast() {
    let service = service_with(Arc::new(fixed_model));
    service.submit_event(event("T", 1, "x")).await.unwrap();
    rebuild_all(&service).await;

    let mut sub = service.connect("T").unwrap();
    let msg = next_message(&mut sub).await;

    let places: Vec<_> = msg.update.new_places.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(places, vec!["p1", "p2"]);
    assert_eq!(msg.update.new_transitions.len(), 1);
    assert_eq!(msg.update.new_edges.len(), 1);
    assert_eq!(msg.update.new_edges[0].source, "p1");
    assert_eq!(msg.update.new_edges[0].target, "t1");
    assert!(msg.update.removed_places.is_empty());
    assert!(sub.receiver.try_recv().is_err());
}

#[tokio::test]
async fn test_broadcast_reaches_only_subscribers_of_the_log() {
    let service = service_with(Arc::new(DirectlyFollowsMiner::new()));
    service.submit_event(event("L", 1, "A")).await.unwrap();
    service.submit_event(event("U", 1, "X")).await.unwrap();
    rebuild_all(&service).await;
    service.broadcast_scheduler().tick();

    let mut on_l = service.connect("L").unwrap();
    let mut on_u = service.connect("U").unwrap();
    let full_l = next_message(&mut on_l).await;
    next_message(&mut on_u).await;

    service.submit_event(event("L", 2, "B")).await.unwrap();
    rebuild_all(&service).await;
    let report = service.broadcast_scheduler().tick();
    assert_eq!(report.updates, 1);
    assert_eq!(report.deliveries, 1);

    let delta = next_message(&mut on_l).await;
    assert_eq!(delta.kind, UpdateKind::Delta);
    assert!(delta.sequence_id > full_l.sequence_id);
    assert_eq!(delta.update.new_transitions.len(), 1);
    assert_eq!(delta.update.new_transitions[0].name, "B");
    assert!(on_u.receiver.try_recv().is_err());
}

#[tokio::test]
async fn test_idle_tick_does_not_invoke_engine() {
    let engine = Arc::new(CountingEngine {
        calls: AtomicUsize::new(0),
    });
    let service = service_with(engine.clone());
    service.submit_event(event("L", 1, "A")).await.unwrap();

    let miner = service.registry().get("L").unwrap();
    assert!(matches!(
        miner.rebuild().await.unwrap(),
        RebuildOutcome::Published { sequence_id: 1 }
    ));
    assert_eq!(miner.rebuild().await.unwrap(), RebuildOutcome::NoNewEvents);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    assert_eq!(miner.pending_updates(), 1);
}

#[tokio::test]
async fn test_ids_survive_rebuilds() {
    let service = service_with(Arc::new(DirectlyFollowsMiner::new()));
    service.submit_event(event("L", 1, "A")).await.unwrap();
    rebuild_all(&service).await;

    let miner = service.registry().get("L").unwrap();
    let before = miner.last_snapshot().unwrap();
    let id_a = before.transitions.get(&"A".to_string()).unwrap().id;

    service.submit_event(event("L", 2, "B")).await.unwrap();
    rebuild_all(&service).await;

    let after = miner.last_snapshot().unwrap();
    assert_eq!(after.transitions.get(&"A".to_string()).unwrap().id, id_a);
    assert_eq!(after.transitions.len(), 2);
}

#[tokio::test]
async fn test_empty_log_is_rejected_everywhere() {
    let service = service_with(Arc::new(DirectlyFollowsMiner::new()));
    let result = service.submit_event(event("  ", 1, "A")).await;
    assert!(matches!(result, Err(MinerError::Validation(_))));
    assert!(service.logs().is_empty());
    assert!(service.registry().is_empty());
}

#[tokio::test]
async fn test_full_buffer_reports_backpressure() {
    let config = PipelineConfig {
        event_buffer_capacity: 1,
        queue_timeout: Duration::from_millis(10),
        ..PipelineConfig::default()
    };
    let service = MinerService::new(
        config,
        Arc::new(DirectlyFollowsMiner::new()),
        Arc::new(MemoryEventStore::new()),
    );

    service.submit_event(event("L", 1, "A")).await.unwrap();
    let result = service.submit_event(event("L", 2, "B")).await;
    assert!(matches!(result, Err(MinerError::Backpressure { .. })));

    // Draining the buffer makes room again
    rebuild_all(&service).await;
    service.submit_event(event("L", 3, "C")).await.unwrap();
}

#[tokio::test]
async fn test_failing_log_does_not_stop_others() {
    fn picky(log: &str, events: &[Event]) -> Result<Snapshot, DiscoveryError> {
        if log == "bad" {
            return Err(DiscoveryError::Failed {
                log: log.to_string(),
                reason: "unsupported".to_string(),
            });
        }
        DirectlyFollowsMiner::new().discover(log, events)
    }

    let service = service_with(Arc::new(picky));
    service.submit_event(event("bad", 1, "A")).await.unwrap();
    service.submit_event(event("good", 1, "A")).await.unwrap();
    rebuild_all(&service).await;

    assert!(service.registry().get("bad").unwrap().last_snapshot().is_none());
    assert!(service.registry().get("good").unwrap().last_snapshot().is_some());
}
