//! Data-flow layer: events, expansion, and the two materializers.

pub mod classify;
pub mod event;
pub mod expand;
pub mod fragment;
pub mod graph;

pub use event::{Continuation, Event, EventContext, EventKind};
pub use expand::{expand_root, finalize_content, EventGraph, EventNode, EventNodeId};
pub use fragment::{materialize_fragment, Fragment, PathTree};
pub use graph::{materialize_graph, RenderEdge, RenderGraph, RenderNode, RenderNodeKind};
