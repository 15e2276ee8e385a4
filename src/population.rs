//! Pre-existing artifacts and executions that synthetic events reference

use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use tracing::info;

use crate::store::MetadataStore;
use crate::types::{Node, NodeKind};

/// Typed node lists, fixed for the duration of a run.
///
/// `artifacts` only holds `Node::Artifact` and `executions` only holds
/// `Node::Execution`; the constructor enforces it so index resolution in the
/// synthesizer never has to check the kind again.
#[derive(Debug, Clone)]
pub struct Population {
    artifacts: Vec<Node>,
    executions: Vec<Node>,
}

impl Population {
    pub fn new(artifacts: Vec<Node>, executions: Vec<Node>) -> Result<Self> {
        check_kind(&artifacts, NodeKind::Artifact)?;
        check_kind(&executions, NodeKind::Execution)?;
        check_unique(&artifacts, NodeKind::Artifact)?;
        check_unique(&executions, NodeKind::Execution)?;
        Ok(Self { artifacts, executions })
    }

    /// Fetch every artifact and execution currently in the store.
    pub async fn discover(store: &dyn MetadataStore) -> Result<Self> {
        let artifacts = store
            .get_artifacts()
            .await
            .context("Failed to list existing artifacts")?;
        let executions = store
            .get_executions()
            .await
            .context("Failed to list existing executions")?;

        if artifacts.is_empty() {
            bail!("No existing artifacts in the store; populate artifacts before filling events");
        }
        if executions.is_empty() {
            bail!("No existing executions in the store; populate executions before filling events");
        }

        info!(
            "Discovered {} artifacts and {} executions",
            artifacts.len(),
            executions.len()
        );
        Ok(Self {
            artifacts: artifacts.into_iter().map(Node::Artifact).collect(),
            executions: executions.into_iter().map(Node::Execution).collect(),
        })
    }

    pub fn artifacts(&self) -> &[Node] {
        &self.artifacts
    }

    pub fn executions(&self) -> &[Node] {
        &self.executions
    }

    pub fn artifact_id(&self, index: usize) -> i64 {
        self.artifacts[index].id()
    }

    pub fn execution_id(&self, index: usize) -> i64 {
        self.executions[index].id()
    }
}

fn check_kind(nodes: &[Node], expected: NodeKind) -> Result<()> {
    if let Some(node) = nodes.iter().find(|n| n.kind() != expected) {
        bail!(
            "Expected only {} nodes, found {} with id {}",
            expected,
            node.kind(),
            node.id()
        );
    }
    Ok(())
}

fn check_unique(nodes: &[Node], kind: NodeKind) -> Result<()> {
    let mut seen = HashSet::with_capacity(nodes.len());
    if let Some(node) = nodes.iter().find(|n| !seen.insert(n.id())) {
        bail!("Duplicate {} id {} in population", kind, node.id());
    }
    Ok(())
}
