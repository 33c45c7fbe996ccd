//! Semantic analysis: scope tree, bindings, member paths
//!
//! One pass over the AST produces a [`SemanticModel`]: the scope tree, the
//! binding table with classified reference sites, recorded imports, and the
//! bindings designated for tracking.

pub mod bindings;
pub mod builder;
pub mod member_path;
pub mod scope;

pub use bindings::{Binding, BindingId, BindingKind, BindingTable, ReferenceRole, ReferenceSite};
pub use builder::{ImportRecord, ImportedName, ScopeBuilder, SemanticModel, TrackedMarker};
pub use member_path::{ExtractedPath, PathBase};
pub use scope::{ParamPattern, PatternLeaf, Scope, ScopeId, ScopeKind, ScopeTree};
