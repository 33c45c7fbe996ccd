//! Event graph expander
//!
//! Grows the event graph depth-first from a declaration root. Every raw
//! event produced by a continuation is rewritten before it becomes a node:
//! the leading binding segment is shifted off, then the inherited matched
//! prefix is consumed pairwise against the remaining path. A mismatch means
//! the flow does not reach this reference and the event is dropped.
//!
//! Nodes deduplicate on event identity through a run-global memo. A memo
//! hit that is an ancestor of the current node is a cycle and only cuts the
//! edge; a hit elsewhere links the existing subgraph, which is how diamonds
//! collapse into shared nodes.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use id_arena::{Arena, Id};

use crate::flow::event::{Event, EventKind};
use crate::session::AnalysisSession;

pub type EventNodeId = Id<EventNode>;

#[derive(Debug)]
pub struct EventNode {
    pub id: EventNodeId,
    pub event: Event,
    /// Rewritten member paths that reached this node; one entry per distinct
    /// incoming edge, root nodes start with none.
    pub paths: Vec<Vec<String>>,
    pub children: Vec<EventNodeId>,
    /// Display label: destination scope name for scope changes, destination
    /// variable for renames, empty otherwise.
    pub label: String,
    /// Fully combined dotted paths of this subgraph, filled by the finalize
    /// pass.
    pub content: BTreeSet<String>,
}

#[derive(Default)]
pub struct EventGraph {
    nodes: Arena<EventNode>,
    memo: BTreeMap<String, EventNodeId>,
}

impl EventGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: EventNodeId) -> &EventNode {
        &self.nodes[id]
    }

    pub fn get_mut(&mut self, id: EventNodeId) -> &mut EventNode {
        &mut self.nodes[id]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn alloc(&mut self, event: Event, label: String) -> EventNodeId {
        let paths = if event.path.is_empty() {
            Vec::new()
        } else {
            vec![event.path.clone()]
        };
        self.nodes.alloc_with_id(|id| EventNode {
            id,
            event,
            paths,
            children: Vec::new(),
            label,
            content: BTreeSet::new(),
        })
    }
}

/// Expands a declaration event into a full subgraph and returns its root.
/// Roots share the session's memo, so a second root in the same run links
/// into subgraphs the first one built.
pub fn expand_root(session: &mut AnalysisSession, root: Event) -> EventNodeId {
    let label = root.from_var.clone();
    let root_id = session.graph_mut().alloc(root, label);
    let mut ancestry = HashSet::new();
    ancestry.insert(root_id);
    expand_children(session, root_id, &mut ancestry);
    root_id
}

fn expand_children(
    session: &mut AnalysisSession,
    node: EventNodeId,
    ancestry: &mut HashSet<EventNodeId>,
) {
    let (continuation, inherited) = {
        let n = session.graph().get(node);
        let mut matched = n.event.context.matched.clone();
        matched.extend(n.event.context.pending.iter().cloned());
        (n.event.continuation.clone(), matched)
    };

    for mut event in continuation.expand(session) {
        event.context.matched = inherited.clone();
        if !rewrite(&mut event) {
            continue;
        }

        let identity = event.identity();
        if let Some(key) = &identity
            && let Some(&existing) = session.graph().memo.get(key)
        {
            if ancestry.contains(&existing) {
                tracing::debug!(identity = %key, "cycle cut at existing ancestor");
                continue;
            }
            let path = event.path.clone();
            let graph = session.graph_mut();
            if !path.is_empty() && !graph.get(existing).paths.contains(&path) {
                graph.get_mut(existing).paths.push(path);
            }
            graph.get_mut(node).children.push(existing);
            continue;
        }

        let label = node_label(session, &event);
        let graph = session.graph_mut();
        let child = graph.alloc(event, label);
        if let Some(key) = identity {
            graph.memo.insert(key, child);
        }
        graph.get_mut(node).children.push(child);

        ancestry.insert(child);
        expand_children(session, child, ancestry);
        ancestry.remove(&child);
    }
}

/// Shifts off the leading binding segment, then consumes the inherited
/// matched prefix against the path. Returns false when a segment disagrees.
fn rewrite(event: &mut Event) -> bool {
    if !event.path.is_empty() {
        event.path.remove(0);
    }
    while !event.context.matched.is_empty() && !event.path.is_empty() {
        if event.context.matched[0] != event.path[0] {
            return false;
        }
        event.context.matched.remove(0);
        event.path.remove(0);
    }
    true
}

fn node_label(session: &AnalysisSession, event: &Event) -> String {
    match event.kind {
        EventKind::ScopeChange => event
            .to_scope
            .map(|s| session.scope_name(s).to_string())
            .unwrap_or_default(),
        EventKind::InScope => event.to_var.clone().unwrap_or_default(),
        EventKind::Declaration | EventKind::Expression => String::new(),
    }
}

/// Post-order pass that fills each node's content set: its own non-empty
/// paths plus the cross product of those paths with every child entry.
/// Nodes without paths pass child entries through unchanged.
pub fn finalize_content(graph: &mut EventGraph, root: EventNodeId) {
    let mut visited = HashSet::new();
    finalize_node(graph, root, &mut visited);
}

fn finalize_node(graph: &mut EventGraph, node: EventNodeId, visited: &mut HashSet<EventNodeId>) {
    if !visited.insert(node) {
        return;
    }
    let children = graph.get(node).children.clone();
    for &child in &children {
        finalize_node(graph, child, visited);
    }

    let own: Vec<String> = graph
        .get(node)
        .paths
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| p.join("."))
        .collect();

    let mut content: BTreeSet<String> = own.iter().cloned().collect();
    for child in children {
        for entry in graph.get(child).content.clone() {
            if own.is_empty() {
                content.insert(entry);
            } else {
                for prefix in &own {
                    content.insert(format!("{prefix}.{entry}"));
                }
            }
        }
    }
    graph.get_mut(node).content = content;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use crate::session::{FsHost, ScopeRef};
    use std::path::Path;

    fn expand_source(source: &str, name: &str) -> (AnalysisSession, EventNodeId) {
        let mut session = AnalysisSession::new(
            TrackerConfig::default(),
            Box::new(FsHost),
            Path::new("/tmp"),
        );
        let file = session.load_root("test.tsx", source).unwrap();
        let root = session.model(file).scope_tree.root().unwrap();
        let event = Event::declaration(name, ScopeRef { file, scope: root });
        let id = expand_root(&mut session, event);
        finalize_content(session.graph_mut(), id);
        (session, id)
    }

    #[test]
    fn unreferenced_binding_expands_to_the_root_alone() {
        let (session, root) = expand_source("const data = load();\n", "data");

        let node = session.graph().get(root);
        assert!(node.children.is_empty());
        assert!(node.content.is_empty());
        assert_eq!(session.graph().node_count(), 1);
    }

    #[test]
    fn member_chain_shifts_the_binding_segment() {
        let (session, root) = expand_source(
            "const data = load();\nconsole.log(data.user.name);\n",
            "data",
        );

        let node = session.graph().get(root);
        assert_eq!(node.children.len(), 1);
        let child = session.graph().get(node.children[0]);
        assert_eq!(child.paths, vec![vec!["user", "name"]]);
        assert_eq!(
            node.content.iter().collect::<Vec<_>>(),
            vec![&"user.name".to_string()]
        );
    }

    #[test]
    fn duplicate_reads_share_one_node() {
        let (session, root) = expand_source(
            "const data = load();\nconsole.log(data.a.b);\nshow(data.a.b);\n",
            "data",
        );

        let node = session.graph().get(root);
        // Two sites, one identity.
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[0], node.children[1]);
        assert_eq!(session.graph().node_count(), 2);
    }

    #[test]
    fn rename_combines_paths_through_the_declarator() {
        let (session, root) = expand_source(
            "const data = load();\nconst short = data.field;\nconsole.log(short.sub.x);\n",
            "data",
        );

        let node = session.graph().get(root);
        assert!(node.content.contains("field"));
        assert!(node.content.contains("field.sub.x"));
    }

    #[test]
    fn mismatched_destructure_leaf_is_discarded() {
        let (session, root) = expand_source(
            "const Card = ({ user }) => user.name;\nconst data = load();\nconst el = <Card user={data.user} />;\nconst el2 = <Card other={data.extra} />;\n",
            "data",
        );

        let node = session.graph().get(root);
        // Attribute `other` never matches the destructured `user` leaf, so
        // only the first attribute contributes fields.
        assert!(node.content.contains("user.name"));
        assert!(!node.content.iter().any(|c| c.contains("extra.")));
    }

    #[test]
    fn mutual_recursion_terminates() {
        let (session, root) = expand_source(
            "const ping = (v) => pong(v.a);\nconst pong = (v) => ping(v.b);\nconst data = load();\nping(data.start);\n",
            "data",
        );

        let node = session.graph().get(root);
        assert!(node.content.contains("start"));
        assert!(node.content.contains("start.a"));
        // Bounded: the alternating chain closes on itself instead of growing.
        assert!(session.graph().node_count() < 16);
    }

    #[test]
    fn arguments_into_distinct_parameters_expand_separately() {
        let (session, root) = expand_source(
            "function f(a, b) { show(a.x); show(b.y); }\nconst data = load();\nf(data.p, data.q);\n",
            "data",
        );

        let node = session.graph().get(root);
        assert!(node.content.contains("p.x"));
        assert!(node.content.contains("q.y"));
        assert!(!node.content.contains("q.x"));
        assert!(!node.content.contains("p.y"));
    }

    #[test]
    fn wrapping_keys_are_consumed_downstream() {
        let (session, root) = expand_source(
            "const fmt = (w) => w.meta.x;\nconst data = load();\nconst wrapped = { meta: data.field };\nfmt(wrapped);\n",
            "data",
        );

        let node = session.graph().get(root);
        assert!(node.content.contains("field.x"));
    }

    #[test]
    fn finalize_is_idempotent() {
        let (mut session, root) = expand_source(
            "const data = load();\nconsole.log(data.a.b);\nconst { c } = data.a;\nshow(c.d.e);\n",
            "data",
        );

        let first = session.graph().get(root).content.clone();
        finalize_content(session.graph_mut(), root);
        let second = session.graph().get(root).content.clone();

        assert_eq!(first, second);
    }
}
