//! Workstream model and collaborator contracts
//!
//! - `WorkstreamNode`: one schedulable unit with its declared prerequisites
//! - `WorkstreamSource`: loads the workstreams of a feature
//! - `WorkstreamExecutor`: performs one workstream's work (opaque)
//!
//! Implementations: `StaticSource` (in-memory), `DirectorySource`
//! (markdown files with front matter), `CommandExecutor` (subprocess).

mod command;
mod loader;

pub use command::CommandExecutor;
pub use loader::{parse_workstream, DirectorySource};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SdpError};

/// A schedulable unit of work belonging to a feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkstreamNode {
    pub id: String,
    pub feature: String,
    /// Opaque status string from the source (e.g. "backlog")
    #[serde(default)]
    pub status: String,
    /// Ids of workstreams that must complete before this one
    #[serde(default, alias = "depends_on")]
    pub prerequisites: Vec<String>,
}

impl WorkstreamNode {
    pub fn new(id: impl Into<String>, feature: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            feature: feature.into(),
            status: String::new(),
            prerequisites: Vec::new(),
        }
    }

    /// Builder: declare prerequisites
    pub fn with_prerequisites<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prerequisites = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set the opaque status
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }
}

/// Loads the workstreams of a feature.
///
/// Must fail with `FeatureNotFound` when the feature has no workstreams.
#[async_trait]
pub trait WorkstreamSource: Send + Sync {
    async fn load_workstreams(&self, feature_id: &str) -> Result<Vec<WorkstreamNode>>;
}

/// Performs one workstream's work.
///
/// Any error is treated as retryable until the retry budget is spent.
/// A workstream may be executed again after a failure or crash, so
/// implementations must make re-execution safe (idempotent side effects).
/// Timeouts are the executor's responsibility; the engine never cancels a call.
#[async_trait]
pub trait WorkstreamExecutor: Send + Sync {
    async fn execute(&self, ws_id: &str) -> anyhow::Result<()>;
}

/// In-memory source, mostly for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    workstreams: Vec<WorkstreamNode>,
}

impl StaticSource {
    pub fn new(workstreams: Vec<WorkstreamNode>) -> Self {
        Self { workstreams }
    }
}

#[async_trait]
impl WorkstreamSource for StaticSource {
    async fn load_workstreams(&self, feature_id: &str) -> Result<Vec<WorkstreamNode>> {
        let found: Vec<WorkstreamNode> = self
            .workstreams
            .iter()
            .filter(|ws| ws.feature == feature_id)
            .cloned()
            .collect();

        if found.is_empty() {
            return Err(SdpError::FeatureNotFound {
                feature_id: feature_id.to_string(),
            });
        }
        Ok(found)
    }
}
