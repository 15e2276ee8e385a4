//! Record types exchanged with the metadata store
//!
//! Artifacts, executions and the events linking them. The store owns the
//! persisted form; these are the in-process views the workload works with.

use serde::{Deserialize, Serialize};

use crate::constants::EVENT_FIXED_OVERHEAD_BYTES;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub id: i64,
    pub type_id: i64,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub id: i64,
    pub type_id: i64,
}

/// A pre-existing node of the store's graph.
///
/// The set of kinds is closed: the event workload only ever links artifacts
/// to executions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Artifact(Artifact),
    Execution(Execution),
}

impl Node {
    pub fn id(&self) -> i64 {
        match self {
            Node::Artifact(a) => a.id,
            Node::Execution(e) => e.id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Artifact(_) => NodeKind::Artifact,
            Node::Execution(_) => NodeKind::Execution,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Artifact,
    Execution,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Artifact => write!(f, "artifact"),
            NodeKind::Execution => write!(f, "execution"),
        }
    }
}

/// Direction of an event relative to its execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Input,
    Output,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Input => "INPUT",
            EventType::Output => "OUTPUT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Index(i64),
    Key(String),
}

/// Ordered steps locating an artifact within an execution's inputs/outputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPath {
    pub steps: Vec<PathStep>,
}

impl EventPath {
    pub fn single_key(key: &str) -> Self {
        Self {
            steps: vec![PathStep::Key(key.to_string())],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub event_type: EventType,
    pub artifact_id: i64,
    pub execution_id: i64,
    pub path: EventPath,
}

/// Approximate payload size of an event for throughput reporting.
///
/// Not wire accurate: fixed overhead for the two ids and the type tag plus
/// the length of every key step.
pub fn transferred_bytes(event: &Event) -> u64 {
    let key_bytes: u64 = event
        .path
        .steps
        .iter()
        .map(|step| match step {
            PathStep::Key(key) => key.len() as u64,
            PathStep::Index(_) => 0,
        })
        .sum();
    EVENT_FIXED_OVERHEAD_BYTES + key_bytes
}

/// One write request: the events dispatched to the store in a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventBatch {
    events: Vec<Event>,
    bytes: u64,
}

impl EventBatch {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            events: Vec::with_capacity(n),
            bytes: 0,
        }
    }

    pub(crate) fn push(&mut self, event: Event) {
        self.bytes += transferred_bytes(&event);
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sum of the per-event byte estimates
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}
