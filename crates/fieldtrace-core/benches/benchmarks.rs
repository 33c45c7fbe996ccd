use std::hint::black_box;
use std::path::Path;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use fieldtrace_core::parser::ParsedFile;
use fieldtrace_core::tracker::DependencyTracker;

fn generate_component_file() -> String {
    let mut code = String::with_capacity(20000);
    code.push_str("// Generated component file for benchmarking\n\n");

    for i in 0..25 {
        code.push_str(&format!(
            r#"const Section{i} = ({{ data{i} }}) => data{i}.title;

const format{i} = (entry) => entry.meta.label;

// track_this_variable
const record{i} = fetchRecord({i});
console.log(record{i}.user.name);
console.log(record{i}.user.email);
const {{ address }} = record{i}.user.contact;
format{i}(record{i}.entry);
record{i}.items.map((item) => item.value);
const view{i} = <Section{i} data{i}={{record{i}.section}} />;

"#,
            i = i
        ));
    }

    code
}

fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");

    let code = generate_component_file();
    let lines = code.lines().count();

    group.throughput(Throughput::Elements(lines as u64));
    group.bench_function("parse_component_file", |b| {
        b.iter(|| ParsedFile::from_source(black_box("benchmark.tsx"), black_box(&code)))
    });

    group.finish();
}

fn bench_tracking(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracking");

    let code = generate_component_file();
    let lines = code.lines().count();
    let tracker = DependencyTracker::new();

    group.throughput(Throughput::Elements(lines as u64));
    group.bench_function("track_25_bindings", |b| {
        b.iter(|| {
            tracker
                .analyze(
                    black_box("benchmark.tsx"),
                    black_box(&code),
                    Path::new("/tmp"),
                )
                .unwrap()
        })
    });

    let deep_code = r#"
const process = (v) => v.a.b.c.d;
// track_this_variable
const data = load();
const first = data.one;
const second = first.two;
const third = second.three;
process(third.payload);
console.log(third.extra.flag);
"#;

    group.bench_function("track_deep_renames", |b| {
        b.iter(|| {
            tracker
                .analyze(black_box("deep.tsx"), black_box(deep_code), Path::new("/tmp"))
                .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_parsing, bench_tracking);
criterion_main!(benches);
