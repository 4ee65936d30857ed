#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::rc::Rc;

use onduty_contracts::{PeriodMarker, Reviewer, Subject};

use crate::history_queue::BoundedHistoryQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Subjects,
    Reviewers,
    Subject,
    Reviewer,
    Period,
    PrimaryGroup,
    SecondaryGroup,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Subjects => "subjects",
            NodeKind::Reviewers => "reviewers",
            NodeKind::Subject => "subject",
            NodeKind::Reviewer => "reviewer",
            NodeKind::Period => "period",
            NodeKind::PrimaryGroup => "primary-group",
            NodeKind::SecondaryGroup => "secondary-group",
        }
    }
}

/// Node payload: a non-owning view of a store row, or the period marker a
/// queue hangs off. Mirrored subject nodes under different reviewers clone
/// the same `Rc`, never the record.
#[derive(Debug, Clone)]
pub enum NodePayload {
    Subject(Rc<Subject>),
    Reviewer(Rc<Reviewer>),
    Period(PeriodMarker),
}

/// One labeled position in the index tree: a tag, optional payload, a named
/// child map, and (on period nodes) the bounded history queue. All mutation
/// stays within the node's own child map and queue.
#[derive(Debug, Clone)]
pub struct IndexNode {
    kind: NodeKind,
    payload: Option<NodePayload>,
    children: BTreeMap<String, IndexNode>,
    queue: Option<BoundedHistoryQueue>,
}

impl IndexNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            payload: None,
            children: BTreeMap::new(),
            queue: None,
        }
    }

    pub fn with_payload(kind: NodeKind, payload: NodePayload) -> Self {
        Self {
            kind,
            payload: Some(payload),
            children: BTreeMap::new(),
            queue: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn payload(&self) -> Option<&NodePayload> {
        self.payload.as_ref()
    }

    pub fn subject_payload(&self) -> Option<&Rc<Subject>> {
        match &self.payload {
            Some(NodePayload::Subject(subject)) => Some(subject),
            _ => None,
        }
    }

    pub fn period_payload(&self) -> Option<&PeriodMarker> {
        match &self.payload {
            Some(NodePayload::Period(period)) => Some(period),
            _ => None,
        }
    }

    pub fn add_child(&mut self, name: impl Into<String>, node: IndexNode) {
        self.children.insert(name.into(), node);
    }

    /// Soft lookup: an absent name is `None`, never an error, so callers can
    /// tell "no such branch" from "branch exists but empty".
    pub fn child(&self, name: &str) -> Option<&IndexNode> {
        self.children.get(name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut IndexNode> {
        self.children.get_mut(name)
    }

    pub fn remove_child(&mut self, name: &str) -> Option<IndexNode> {
        self.children.remove(name)
    }

    /// Create-if-absent slot access; the write-through path uses this at
    /// every level so a newly started period is indexed on first insert.
    pub fn ensure_child_with(
        &mut self,
        name: &str,
        make: impl FnOnce() -> IndexNode,
    ) -> &mut IndexNode {
        self.children.entry(name.to_string()).or_insert_with(make)
    }

    /// Children in deterministic name order. The order carries no meaning;
    /// it only keeps query output stable for tests and serialization.
    pub fn children(&self) -> impl Iterator<Item = (&str, &IndexNode)> {
        self.children.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn children_mut(&mut self) -> impl Iterator<Item = (&str, &mut IndexNode)> {
        self.children.iter_mut().map(|(name, node)| (name.as_str(), node))
    }

    /// Idempotent: a later call never resizes an existing queue, whatever
    /// capacity it asks for.
    pub fn ensure_queue(&mut self, capacity: usize) -> &mut BoundedHistoryQueue {
        self.queue.get_or_insert_with(|| BoundedHistoryQueue::new(capacity))
    }

    pub fn queue(&self) -> Option<&BoundedHistoryQueue> {
        self.queue.as_ref()
    }
}
