//! Flow events
//!
//! An event is one immutable step of data flow for one binding: a plain
//! expression read, an in-scope rename, a scope change through a call or a
//! markup attribute, or the synthetic declaration root. Continuations are
//! an explicit enum rather than closures so that event identity stays
//! inspectable for the expansion memo.

use crate::session::{AnalysisSession, ScopeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Declaration,
    Expression,
    InScope,
    ScopeChange,
}

/// Path bookkeeping threaded through expansion: `pending` is prepended for
/// everything resolved downstream, `matched` is what has already been
/// consumed against downstream paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventContext {
    pub pending: Vec<String>,
    pub matched: Vec<String>,
}

/// Deferred computation of the next layer of events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// No further flow.
    Terminal,
    /// Follow every reference of `name` resolved from `target`.
    Binding { target: ScopeRef, name: String },
    /// Bind to the formal parameter at `index` of `target`; a destructured
    /// parameter expands into per-leaf rename events whose paths start at
    /// the caller's last path segment.
    Param {
        target: ScopeRef,
        index: usize,
        caller_segment: String,
    },
}

impl Continuation {
    pub fn expand(&self, session: &mut AnalysisSession) -> Vec<Event> {
        match self {
            Continuation::Terminal => Vec::new(),
            Continuation::Binding { target, name } => {
                crate::flow::classify::events_for_binding(session, *target, name)
            }
            Continuation::Param {
                target,
                index,
                caller_segment,
            } => crate::flow::classify::param_events(session, *target, *index, caller_segment),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub from_var: String,
    pub from_scope: ScopeRef,
    pub to_var: Option<String>,
    pub to_scope: Option<ScopeRef>,
    /// Member path consumed at this step, leading binding segment included
    /// until the expander shifts it off.
    pub path: Vec<String>,
    pub context: EventContext,
    pub continuation: Continuation,
}

impl Event {
    pub fn declaration(name: &str, scope: ScopeRef) -> Self {
        Event {
            kind: EventKind::Declaration,
            from_var: name.to_string(),
            from_scope: scope,
            to_var: None,
            to_scope: None,
            path: Vec::new(),
            context: EventContext::default(),
            continuation: Continuation::Binding {
                target: scope,
                name: name.to_string(),
            },
        }
    }

    /// Deterministic identity used for node deduplication. Declarations are
    /// roots and never deduplicate.
    pub fn identity(&self) -> Option<String> {
        match self.kind {
            EventKind::Declaration => None,
            EventKind::Expression => Some(format!(
                "expression-->{}-->{}-->{}",
                scope_key(self.from_scope),
                self.from_var,
                self.path.join(".")
            )),
            EventKind::InScope => {
                let to_scope = self.to_scope?;
                Some(format!(
                    "in-scope-->{}-->{}-->{}",
                    scope_key(to_scope),
                    self.to_var.as_deref().unwrap_or(""),
                    self.context.matched.join(".")
                ))
            }
            EventKind::ScopeChange => {
                let to_scope = self.to_scope?;
                // The bound parameter position distinguishes two arguments
                // flowing into different parameters of the same callee.
                let position = match &self.continuation {
                    Continuation::Param { index, .. } => *index,
                    Continuation::Terminal | Continuation::Binding { .. } => 0,
                };
                Some(format!(
                    "scope-change-->{}-->{}-->{}-->{}",
                    scope_key(to_scope),
                    self.to_var.as_deref().unwrap_or(""),
                    position,
                    self.context.pending.join(".")
                ))
            }
        }
    }
}

fn scope_key(scope: ScopeRef) -> String {
    format!("{}:{}", scope.file.index(), scope.scope.index())
}
