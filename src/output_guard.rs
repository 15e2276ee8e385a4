//! Enforces "an artifact is the OUTPUT of at most one event"
//!
//! Two sources of truth are consulted: the artifacts this run has already
//! handed out as OUTPUT targets, and the events the store already holds from
//! earlier runs.

use std::collections::HashSet;

use anyhow::{Context, Result};
use tracing::trace;

use crate::store::MetadataStore;
use crate::types::EventType;

/// Run-scoped bookkeeping of artifacts that can no longer be an OUTPUT target.
#[derive(Debug, Default)]
pub struct OutputArtifactGuard {
    used: HashSet<i64>,
    store_queries: u64,
}

impl OutputArtifactGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-insert against the run-scoped set.
    ///
    /// Returns true if `artifact_id` was already taken this run; otherwise
    /// records it as taken and returns false.
    pub fn was_used_this_run(&mut self, artifact_id: i64) -> bool {
        !self.used.insert(artifact_id)
    }

    /// True iff the store already holds an OUTPUT event for `artifact_id`.
    ///
    /// `NotFound` from the store means no events at all, hence unused.
    pub async fn was_used_in_store(&mut self, store: &dyn MetadataStore, artifact_id: i64) -> Result<bool> {
        self.store_queries += 1;
        match store.get_events_by_artifact_ids(&[artifact_id]).await {
            Ok(events) => Ok(events.iter().any(|e| e.event_type == EventType::Output)),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e).with_context(|| {
                format!("Failed to query existing events for artifact {}", artifact_id)
            }),
        }
    }

    /// Try to reserve `artifact_id` as a new OUTPUT target.
    ///
    /// The local set is consulted first and the store only when the local
    /// check passes. The artifact is committed to the run-scoped set once the
    /// store confirms it is unused. Artifacts the store reports as used are
    /// recorded too, since they can never become eligible again.
    pub async fn claim(&mut self, store: &dyn MetadataStore, artifact_id: i64) -> Result<bool> {
        if self.used.contains(&artifact_id) {
            trace!("artifact {} already an OUTPUT target in this run", artifact_id);
            return Ok(false);
        }

        let in_store = self.was_used_in_store(store, artifact_id).await?;
        let taken = self.was_used_this_run(artifact_id);
        debug_assert!(!taken);

        if in_store {
            trace!("artifact {} already an OUTPUT target in the store", artifact_id);
            return Ok(false);
        }
        Ok(true)
    }

    pub fn contains(&self, artifact_id: i64) -> bool {
        self.used.contains(&artifact_id)
    }

    /// Number of artifacts no longer eligible in this run
    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    pub fn store_queries(&self) -> u64 {
        self.store_queries
    }

    /// Forget everything; called at the start of every set-up.
    pub fn reset(&mut self) {
        self.used.clear();
        self.store_queries = 0;
    }
}
