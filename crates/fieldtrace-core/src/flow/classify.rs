//! Reference classifier
//!
//! Turns the reference sites recorded for one binding into flow events.
//! Classification priority per site was frozen by the scope builder; here
//! each role maps to an event shape:
//!
//! * declarator initializer: one in-scope event per bound leaf
//! * call argument: scope change into the callee, parameter continuation
//! * iteration receiver: scope change into the callback, parameter zero
//! * markup attribute: scope change into the component, `props`-prefixed
//!   for class-shaped targets
//! * bare mention: terminal expression when any member access remains
//!
//! Results are memoized per binding so a binding referenced from several
//! places is classified once per run.

use crate::flow::event::{Continuation, Event, EventContext, EventKind};
use crate::semantic::{ParamPattern, PatternLeaf, ReferenceRole, ReferenceSite};
use crate::session::{AnalysisSession, FileId, ScopeRef};

pub fn events_for_binding(session: &mut AnalysisSession, at: ScopeRef, name: &str) -> Vec<Event> {
    let Some(binding) = session.lookup_binding(at, name) else {
        tracing::debug!(name, "reference to undeclared name, nothing to follow");
        return Vec::new();
    };
    if let Some(cached) = session.cached_events(at.file, binding) {
        return cached.clone();
    }

    let sites: Vec<ReferenceSite> = session
        .model(at.file)
        .bindings
        .get(binding)
        .references
        .clone();

    let mut events = Vec::new();
    for site in &sites {
        classify_site(session, at.file, name, site, &mut events);
    }

    session.cache_events(at.file, binding, events.clone());
    events
}

/// Events for flow arriving at the formal parameter `index` of `target`.
/// An identifier parameter delegates to its references; a destructured
/// parameter becomes per-leaf rename events anchored at the caller's last
/// path segment.
pub fn param_events(
    session: &mut AnalysisSession,
    target: ScopeRef,
    index: usize,
    caller_segment: &str,
) -> Vec<Event> {
    let pattern = session
        .model(target.file)
        .scope_tree
        .get(target.scope)
        .params
        .get(index)
        .cloned();

    match pattern {
        Some(ParamPattern::Ident(name)) => events_for_binding(session, target, &name),
        Some(ParamPattern::Object(leaves)) => leaves
            .iter()
            .map(|leaf| destructured_param_event(target, caller_segment, leaf))
            .collect(),
        Some(ParamPattern::Opaque) | None => Vec::new(),
    }
}

fn destructured_param_event(target: ScopeRef, caller_segment: &str, leaf: &PatternLeaf) -> Event {
    let mut path = vec![caller_segment.to_string()];
    path.extend(leaf.path.iter().cloned());
    Event {
        kind: EventKind::InScope,
        from_var: caller_segment.to_string(),
        from_scope: target,
        to_var: Some(leaf.name.clone()),
        to_scope: Some(target),
        path,
        context: EventContext::default(),
        continuation: Continuation::Binding {
            target,
            name: leaf.name.clone(),
        },
    }
}

fn classify_site(
    session: &mut AnalysisSession,
    file: FileId,
    name: &str,
    site: &ReferenceSite,
    out: &mut Vec<Event>,
) {
    let from_scope = ScopeRef {
        file,
        scope: site.scope,
    };

    match &site.role {
        ReferenceRole::Declarator { leaves } => {
            for leaf in leaves {
                let mut path = site.path.clone();
                path.extend(leaf.path.iter().cloned());
                out.push(Event {
                    kind: EventKind::InScope,
                    from_var: name.to_string(),
                    from_scope,
                    to_var: Some(leaf.name.clone()),
                    to_scope: Some(from_scope),
                    path,
                    context: pending(site.wrap_prefix.clone()),
                    continuation: Continuation::Binding {
                        target: from_scope,
                        name: leaf.name.clone(),
                    },
                });
            }
        }
        ReferenceRole::CallArg { callee, index } => {
            match session.resolve_scope(from_scope, callee) {
                Some(target) => out.push(Event {
                    kind: EventKind::ScopeChange,
                    from_var: name.to_string(),
                    from_scope,
                    to_var: Some(callee.clone()),
                    to_scope: Some(target),
                    path: site.path.clone(),
                    context: pending(site.wrap_prefix.clone()),
                    continuation: Continuation::Param {
                        target,
                        index: *index,
                        caller_segment: last_segment(site, name),
                    },
                }),
                None => push_terminal(name, from_scope, site, out),
            }
        }
        ReferenceRole::IterationCall { callback } => {
            let target = ScopeRef {
                file,
                scope: *callback,
            };
            out.push(Event {
                kind: EventKind::ScopeChange,
                from_var: name.to_string(),
                from_scope,
                to_var: Some(session.scope_name(target).to_string()),
                to_scope: Some(target),
                path: site.path.clone(),
                context: pending(site.wrap_prefix.clone()),
                continuation: Continuation::Param {
                    target,
                    index: 0,
                    caller_segment: last_segment(site, name),
                },
            });
        }
        ReferenceRole::JsxAttribute { component, attr } => {
            match session.resolve_scope(from_scope, component) {
                Some(target) => {
                    let class_shaped = session.scope_kind(target).is_class_shaped();
                    let mut pending_path = if class_shaped {
                        vec!["props".to_string(), attr.clone()]
                    } else {
                        vec![attr.clone()]
                    };
                    pending_path.extend(site.wrap_prefix.iter().cloned());
                    let continuation = if class_shaped {
                        Continuation::Binding {
                            target,
                            name: "this".to_string(),
                        }
                    } else {
                        Continuation::Param {
                            target,
                            index: 0,
                            caller_segment: attr.clone(),
                        }
                    };
                    out.push(Event {
                        kind: EventKind::ScopeChange,
                        from_var: name.to_string(),
                        from_scope,
                        to_var: Some(component.clone()),
                        to_scope: Some(target),
                        path: site.path.clone(),
                        context: pending(pending_path),
                        continuation,
                    });
                }
                None => push_terminal(name, from_scope, site, out),
            }
        }
        ReferenceRole::Bare => push_terminal(name, from_scope, site, out),
    }
}

/// A lone mention without member access carries no field information, so a
/// terminal expression only appears for paths of at least two segments.
fn push_terminal(name: &str, from_scope: ScopeRef, site: &ReferenceSite, out: &mut Vec<Event>) {
    if site.path.len() > 1 {
        out.push(Event {
            kind: EventKind::Expression,
            from_var: name.to_string(),
            from_scope,
            to_var: None,
            to_scope: None,
            path: site.path.clone(),
            context: pending(site.wrap_prefix.clone()),
            continuation: Continuation::Terminal,
        });
    }
}

fn pending(paths: Vec<String>) -> EventContext {
    EventContext {
        pending: paths,
        matched: Vec::new(),
    }
}

fn last_segment(site: &ReferenceSite, name: &str) -> String {
    site.path
        .last()
        .cloned()
        .unwrap_or_else(|| name.to_string())
}
