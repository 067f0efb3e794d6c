//! Task keys and the in-flight tracker
//!
//! A generation task is identified by what it produces and which node it
//! targets. The tracker holds the set of keys currently pending; a key can be
//! pending at most once, so repeated triggers on the same node are dropped
//! while distinct nodes run in parallel.

use dashmap::DashSet;
use std::fmt;
use std::sync::Arc;

use crate::course::NodeId;

/// What a generation task produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Outline,
    SectionContent,
    Exercises,
    Exam,
    Solver,
    TopicExtraction,
    DocumentExtraction,
    Image,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Outline => "outline",
            TaskKind::SectionContent => "section_content",
            TaskKind::Exercises => "exercises",
            TaskKind::Exam => "exam",
            TaskKind::Solver => "solver",
            TaskKind::TopicExtraction => "topic_extraction",
            TaskKind::DocumentExtraction => "document_extraction",
            TaskKind::Image => "image",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind plus target node (none for course-level tasks)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskKey {
    pub kind: TaskKind,
    pub target: Option<NodeId>,
}

impl TaskKey {
    pub fn course(kind: TaskKind) -> Self {
        Self { kind, target: None }
    }

    pub fn node(kind: TaskKind, target: &NodeId) -> Self {
        Self {
            kind,
            target: Some(target.clone()),
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "{}:{}", self.kind, target),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// How a triggered task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Result applied to the document
    Applied,
    /// Failed or empty result; nothing changed
    NoResult,
    /// Same key already pending; no call was made
    AlreadyRunning,
}

impl TaskOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, TaskOutcome::Applied)
    }
}

/// Concurrent set of pending task keys
#[derive(Debug, Clone, Default)]
pub struct TaskTracker {
    in_flight: Arc<DashSet<TaskKey>>,
}

impl TaskTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` pending. `None` when it already is.
    ///
    /// The returned guard clears the key when dropped, whichever way the task ends.
    pub fn try_begin(&self, key: TaskKey) -> Option<TaskGuard> {
        if !self.in_flight.insert(key.clone()) {
            return None;
        }
        Some(TaskGuard {
            key,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Any task of this kind pending, whatever its target
    pub fn is_busy(&self, kind: TaskKind) -> bool {
        self.in_flight.iter().any(|key| key.kind == kind)
    }

    pub fn is_target_busy(&self, kind: TaskKind, target: &NodeId) -> bool {
        self.in_flight.contains(&TaskKey::node(kind, target))
    }

    /// Snapshot of the pending keys
    pub fn in_flight(&self) -> Vec<TaskKey> {
        self.in_flight.iter().map(|key| key.clone()).collect()
    }
}

/// Pending marker for one task key
#[derive(Debug)]
pub struct TaskGuard {
    key: TaskKey,
    in_flight: Arc<DashSet<TaskKey>>,
}

impl TaskGuard {
    pub fn key(&self) -> &TaskKey {
        &self.key
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.in_flight.remove(&self.key);
    }
}
