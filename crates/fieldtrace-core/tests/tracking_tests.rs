//! End-to-end tracking tests over whole source files
//!
//! Exercises the full pipeline from marker comment to report: event graph
//! shape, fragment text, render graph, and the flat path set, including
//! cross-file flows through a temporary project directory.

use std::fs;
use std::path::Path;

use fieldtrace_core::flow::RenderNodeKind;
use fieldtrace_core::tracker::{DependencyTracker, TrackReport};
use fieldtrace_core::TrackError;

fn analyze(source: &str) -> Vec<TrackReport> {
    DependencyTracker::new()
        .analyze("main.tsx", source, Path::new("/tmp"))
        .expect("analysis should succeed")
}

fn single(source: &str) -> TrackReport {
    let mut reports = analyze(source);
    assert_eq!(reports.len(), 1, "expected exactly one report");
    reports.remove(0)
}

#[test]
fn binding_without_references_yields_one_node_and_empty_fragment() {
    let report = single("// track_this_variable\nconst data = load();\n");

    assert_eq!(report.graph.nodes.len(), 1);
    assert_eq!(report.graph.nodes[0].kind, RenderNodeKind::Declaration);
    assert!(report.graph.edges.is_empty());
    assert!(report.fragment.is_empty());
    assert!(report.paths.is_empty());
}

#[test]
fn three_segment_chain_yields_three_linked_nodes() {
    let report = single("// track_this_variable\nconst a = load();\nconsole.log(a.b.c);\n");

    assert_eq!(report.graph.nodes.len(), 3);
    assert_eq!(report.graph.edges.len(), 2);
    assert_eq!(report.paths.iter().collect::<Vec<_>>(), vec!["b.c"]);
}

#[test]
fn destructuring_produces_two_independent_flows() {
    let report = single(
        "// track_this_variable\nconst data = load();\nconst { name, meta } = data.user;\nshow(name.first.last);\nshow(meta.id.raw);\n",
    );

    assert!(report.paths.contains("user.name"));
    assert!(report.paths.contains("user.meta"));
    assert!(report.paths.contains("user.name.first.last"));
    assert!(report.paths.contains("user.meta.id.raw"));

    let renames: Vec<_> = report
        .graph
        .nodes
        .iter()
        .filter(|n| n.kind == RenderNodeKind::Rename)
        .collect();
    assert_eq!(renames.len(), 2);
}

#[test]
fn call_argument_combines_paths_across_the_scope_change() {
    let report = single(
        "const fmt = (p) => p.sub;\n// track_this_variable\nconst data = load();\nfmt(data.field);\n",
    );

    assert!(report.paths.contains("field"));
    assert!(report.paths.contains("field.sub"));
    assert!(report.fragment_text.contains("...fmt"));
    assert!(report.fragment_text.contains("fragment fmt on data"));
}

#[test]
fn iteration_callback_contributes_item_fields() {
    let report = single(
        "// track_this_variable\nconst data = load();\ndata.items.map((item) => item.name);\n",
    );

    assert!(report.paths.contains("items"));
    assert!(report.paths.contains("items.name"));
}

#[test]
fn mutually_recursive_helpers_terminate() {
    let report = single(
        "const ping = (v) => pong(v.a);\nconst pong = (v) => ping(v.b);\n// track_this_variable\nconst data = load();\nping(data.start);\n",
    );

    assert!(report.paths.contains("start.a"));
    // The alternating cycle closes instead of growing without bound.
    assert!(report.graph.nodes.len() < 32);
}

#[test]
fn diamond_flow_dedupes_into_shared_nodes() {
    let report = single(
        "// track_this_variable\nconst data = load();\nconsole.log(data.x.y);\nshow(data.x.y);\n",
    );

    let access_names: Vec<_> = report
        .graph
        .nodes
        .iter()
        .filter(|n| n.kind == RenderNodeKind::Access)
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(access_names, vec!["x", "y"]);
    assert_eq!(report.paths.iter().collect::<Vec<_>>(), vec!["x.y"]);
}

#[test]
fn materialization_is_byte_identical_across_runs() {
    let source = "const Card = ({ user }) => user.name;\n// track_this_variable\nconst data = load();\nconst el = <Card user={data.user} />;\nconst { id } = data.meta;\nshow(id.raw);\n";

    let first = single(source);
    let second = single(source);

    assert_eq!(first.fragment_text, second.fragment_text);
    assert_eq!(first.graph, second.graph);
    assert_eq!(first.paths, second.paths);
}

#[test]
fn jsx_function_component_follows_the_matching_attribute() {
    let report = single(
        "const Card = ({ user }) => user.name;\n// track_this_variable\nconst data = load();\nconst el = <Card user={data.person} other={data.rest} />;\n",
    );

    assert!(report.paths.contains("person.name"));
    assert!(!report.paths.iter().any(|p| p.starts_with("rest.")));
}

#[test]
fn jsx_class_component_routes_through_props() {
    let report = single(
        "class Panel extends Component {\n  render() {\n    return this.props.info.title;\n  }\n}\n// track_this_variable\nconst data = load();\nconst el = <Panel info={data.details} />;\n",
    );

    assert!(report.paths.contains("details.title"));
}

#[test]
fn object_wrapping_keys_are_consumed_by_the_consumer() {
    let report = single(
        "const fmt = (w) => w.meta.x;\n// track_this_variable\nconst data = load();\nconst wrapped = { meta: data.field };\nfmt(wrapped);\n",
    );

    assert!(report.paths.contains("field.x"));
}

#[test]
fn reserved_properties_terminate_the_path() {
    let report = single(
        "// track_this_variable\nconst data = load();\nconsole.log(data.items.length);\n",
    );

    assert!(report.paths.contains("items"));
    assert!(!report.paths.contains("items.length"));
}

#[test]
fn string_literal_computed_access_counts_as_a_segment() {
    let report = single(
        "// track_this_variable\nconst data = load();\nconsole.log(data[\"user\"].name);\nconsole.log(data[key].other);\n",
    );

    assert!(report.paths.contains("user.name"));
    assert!(!report.paths.iter().any(|p| p.contains("other")));
}

#[test]
fn conditional_guard_does_not_count_as_consumption() {
    let report = single(
        "// track_this_variable\nconst data = load();\nconst v = data.flag && data.a.b;\n",
    );

    assert!(report.paths.contains("a.b"));
}

#[test]
fn multiple_markers_yield_multiple_reports() {
    let reports = analyze(
        "// track_this_variable\nconst one = load();\nshow(one.a.b);\n// track_this_variable\nconst two = load();\nshow(two.c.d);\n",
    );

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].name, "one");
    assert_eq!(reports[1].name, "two");
    assert!(reports[0].paths.contains("a.b"));
    assert!(reports[1].paths.contains("c.d"));
}

#[test]
fn entry_file_parse_failure_is_fatal() {
    let result = DependencyTracker::new().analyze("main.tsx", "const ] = ;", Path::new("/tmp"));

    assert!(matches!(result, Err(TrackError::Parse { .. })));
}

#[test]
fn flow_crosses_a_relative_import() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("format.ts"),
        "export const formatUser = (u) => u.profile.name;\n",
    )
    .unwrap();
    let entry = dir.path().join("main.tsx");
    let source = "import { formatUser } from './format';\n// track_this_variable\nconst data = load();\nformatUser(data.user);\n";

    let reports = DependencyTracker::new()
        .analyze(&entry.to_string_lossy(), source, dir.path())
        .unwrap();

    assert!(reports[0].paths.contains("user.profile.name"));
    assert!(reports[0].fragment_text.contains("...formatUser"));
}

#[test]
fn flow_crosses_a_default_import_component() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("card.tsx"),
        "const Card = ({ person }) => person.email;\nexport default Card;\n",
    )
    .unwrap();
    let entry = dir.path().join("main.tsx");
    let source = "import Card from './card';\n// track_this_variable\nconst data = load();\nconst el = <Card person={data.owner} />;\n";

    let reports = DependencyTracker::new()
        .analyze(&entry.to_string_lossy(), source, dir.path())
        .unwrap();

    assert!(reports[0].paths.contains("owner.email"));
}

#[test]
fn unresolvable_import_degrades_to_a_terminal_read() {
    let dir = tempfile::tempdir().unwrap();
    let entry = dir.path().join("main.tsx");
    let source = "import { helper } from './missing';\n// track_this_variable\nconst data = load();\nhelper(data.a.b);\n";

    let reports = DependencyTracker::new()
        .analyze(&entry.to_string_lossy(), source, dir.path())
        .unwrap();

    // The call target is unknown; the member access itself still counts.
    assert!(reports[0].paths.contains("a.b"));
    assert!(!reports[0].fragment_text.contains("..."));
}

#[test]
fn broken_imported_file_is_absorbed() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bad.ts"), "export const x = {{{;\n").unwrap();
    let entry = dir.path().join("main.tsx");
    let source = "import { x } from './bad';\n// track_this_variable\nconst data = load();\nx(data.a.b);\n";

    let reports = DependencyTracker::new()
        .analyze(&entry.to_string_lossy(), source, dir.path())
        .unwrap();

    assert!(reports[0].paths.contains("a.b"));
}
