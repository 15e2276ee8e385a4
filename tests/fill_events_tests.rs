//! End-to-end fill-events scenarios against the in-memory store
//!
//! Covers batch sizing, the at-most-one-OUTPUT invariant across runs,
//! population bounds, byte accounting and tear-down idempotence.

use mdstore_bench::config::{CategoricalDistribution, FillEventsConfig, UniformRange};
use mdstore_bench::population::Population;
use mdstore_bench::runner::run_workload;
use mdstore_bench::types::{Event, EventPath, EventType};
use mdstore_bench::{FillEvents, InMemoryStore, MetadataStore, Workload};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

fn fill_config(specification: EventType, minimum: u64, maximum: u64, alpha: f64) -> FillEventsConfig {
    FillEventsConfig {
        specification,
        num_events: UniformRange { minimum, maximum },
        artifact_node_popularity: CategoricalDistribution { dirichlet_alpha: alpha },
        execution_node_popularity: CategoricalDistribution { dirichlet_alpha: alpha },
    }
}

/// Single artifact, single execution, one OUTPUT event. A second identical
/// instance afterwards has nothing left to write to.
#[tokio::test]
async fn test_single_node_output_then_starvation() {
    let store = InMemoryStore::with_population(1, 1);
    let population = Population::discover(&store).await.unwrap();

    let mut first = FillEvents::new(fill_config(EventType::Output, 1, 1, 1.0), 1, population.clone(), Some(1));
    first.set_up(&store).await.unwrap();
    assert_eq!(first.work_items().len(), 1);
    let events = first.work_items()[0].events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::Output);
    assert_eq!(events[0].artifact_id, 1);
    assert_eq!(events[0].execution_id, 1);

    first.run_op(0, &store).await.unwrap();
    first.tear_down().unwrap();

    let mut second = FillEvents::new(fill_config(EventType::Output, 1, 1, 1.0), 1, population, Some(2));
    let err = second.set_up(&store).await.unwrap_err();
    assert!(format!("{:#}", err).contains("no eligible artifact"));
    assert!(second.work_items().is_empty());
}

/// 3x3 population, INPUT, 2 operations of exactly 2 events: no duplicate
/// checks against the store at all.
#[tokio::test]
async fn test_input_workload_never_queries_store() {
    let store = InMemoryStore::with_population(3, 3);
    let population = Population::discover(&store).await.unwrap();

    let mut w = FillEvents::new(fill_config(EventType::Input, 2, 2, 1.0), 2, population, Some(3));
    w.set_up(&store).await.unwrap();

    assert_eq!(w.work_items().len(), 2);
    for batch in w.work_items() {
        assert_eq!(batch.len(), 2);
        assert!(batch.events().iter().all(|e| e.event_type == EventType::Input));
    }
    assert_eq!(store.query_count(), 0);
}

#[tokio::test]
async fn test_output_invariant_holds_with_prior_store_state() {
    let store = InMemoryStore::with_population(60, 5);
    // Earlier runs already produced artifacts 1..=10
    let prior: Vec<Event> = (1..=10)
        .map(|artifact_id| Event {
            event_type: EventType::Output,
            artifact_id,
            execution_id: 1,
            path: EventPath::single_key("foo"),
        })
        .collect();
    store.put_events(&prior).await.unwrap();

    let population = Population::discover(&store).await.unwrap();
    let mut w = FillEvents::new(fill_config(EventType::Output, 1, 4, 0.5), 10, population, Some(4));
    let summary = run_workload(&mut w, &store, None).await.unwrap();
    assert_eq!(summary.ops, 10);

    let mut outputs: HashMap<i64, usize> = HashMap::new();
    for event in store.events() {
        if event.event_type == EventType::Output {
            *outputs.entry(event.artifact_id).or_default() += 1;
        }
    }
    assert!(outputs.values().all(|&n| n == 1), "artifact with several OUTPUT events: {:?}", outputs);
    assert_eq!(outputs.len() as u64, 10 + summary.events);
}

#[tokio::test]
async fn test_ids_come_from_population() {
    let store = InMemoryStore::with_population(7, 4);
    // Discover only part of the store; nothing outside it may be referenced
    let all = Population::discover(&store).await.unwrap();
    let population = Population::new(all.artifacts()[2..5].to_vec(), all.executions()[1..3].to_vec()).unwrap();

    let mut w = FillEvents::new(fill_config(EventType::Input, 5, 10, 1.0), 20, population, Some(5));
    w.set_up(&store).await.unwrap();
    for batch in w.work_items() {
        for e in batch.events() {
            assert!((3..=5).contains(&e.artifact_id), "artifact {}", e.artifact_id);
            assert!((2..=3).contains(&e.execution_id), "execution {}", e.execution_id);
        }
    }
}

#[tokio::test]
async fn test_byte_accounting_is_additive() {
    let store = InMemoryStore::with_population(10, 10);
    let population = Population::discover(&store).await.unwrap();
    let mut w = FillEvents::new(fill_config(EventType::Input, 1, 6, 1.0), 15, population, Some(6));
    w.set_up(&store).await.unwrap();

    let mut total = 0;
    for batch in w.work_items() {
        assert_eq!(batch.bytes(), 20 * batch.len() as u64);
        total += batch.bytes();
    }
    assert_eq!(w.total_bytes(), total);
    assert_eq!(w.synthesis_stats().bytes, total);
}

#[tokio::test]
async fn test_tear_down_idempotent() {
    let store = InMemoryStore::with_population(2, 2);
    let population = Population::discover(&store).await.unwrap();
    let mut w = FillEvents::new(fill_config(EventType::Input, 1, 1, 1.0), 3, population, Some(7));

    // Before set-up too
    w.tear_down().unwrap();
    w.set_up(&store).await.unwrap();
    w.tear_down().unwrap();
    let state = w.state();
    w.tear_down().unwrap();
    assert_eq!(w.state(), state);
    assert!(w.work_items().is_empty());
}

#[tokio::test]
async fn test_run_replays_batches_unchanged() {
    let store = InMemoryStore::with_population(5, 5);
    let population = Population::discover(&store).await.unwrap();
    let mut w = FillEvents::new(fill_config(EventType::Output, 1, 1, 1.0), 5, population, Some(8));
    w.set_up(&store).await.unwrap();

    let expected: Vec<Event> = w
        .work_items()
        .iter()
        .flat_map(|b| b.events().iter().cloned())
        .collect();
    for i in 0..w.num_operations() {
        w.run_op(i, &store).await.unwrap();
    }
    assert_eq!(store.events(), expected);
}

/// Heavily skewed popularity leaves most artifacts with zero weight. More
/// OUTPUT operations than drawable artifacts must end set-up promptly.
#[tokio::test]
async fn test_skewed_output_set_up_terminates() {
    let store = InMemoryStore::with_population(100, 10);
    let population = Population::discover(&store).await.unwrap();
    let mut w = FillEvents::new(fill_config(EventType::Output, 1, 1, 0.001), 80, population, Some(4));

    let result = tokio::time::timeout(Duration::from_secs(10), w.set_up(&store))
        .await
        .expect("set-up did not finish");

    match result {
        Ok(()) => {
            let ids: HashSet<i64> = w
                .work_items()
                .iter()
                .flat_map(|b| b.events().iter().map(|e| e.artifact_id))
                .collect();
            assert_eq!(ids.len(), 80);
        }
        Err(err) => {
            assert!(format!("{:#}", err).contains("no eligible artifact"), "{:#}", err);
            assert!(w.work_items().is_empty());
        }
    }
}
