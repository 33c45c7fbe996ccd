//! Cross-file data-flow dependency tracking for JavaScript and TypeScript.
//!
//! Bindings designated by marker comments are followed through member
//! accesses, destructuring, calls, iteration callbacks, and JSX attributes,
//! across files when imports resolve. Each tracked binding yields a render
//! graph, a per-scope fragment summary, and a flat set of member paths.

pub mod config;
pub mod error;
pub mod flow;
pub mod parser;
pub mod semantic;
pub mod session;
pub mod tracker;

pub use config::{load_config, load_config_or_default, ConfigError, TrackerConfig};
pub use error::TrackError;
pub use flow::{Fragment, PathTree, RenderEdge, RenderGraph, RenderNode, RenderNodeKind};
pub use parser::{Language, ParseError, ParsedFile, Parser};
pub use session::{AnalysisSession, FileHost, FsHost, ScopeRef};
pub use tracker::{DependencyTracker, TrackReport};
