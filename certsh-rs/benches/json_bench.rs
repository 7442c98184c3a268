use criterion::{black_box, criterion_group, criterion_main, Criterion};

use certsh::json::{Document, Mode, Overrides};
use certsh::script::{tokenize, Interpreter};

fn make_doc(ports: usize) -> String {
    let items: Vec<String> = (0..ports)
        .map(|i| format!(r#"{{"id":{i},"name":"port {i}","up":{},"caps":[1,2,3]}}"#, i % 2 == 0))
        .collect();
    format!(r#"{{"device":{{"vendor":"acme","ports":[{}]}}}}"#, items.join(","))
}

fn bench_json(c: &mut Criterion) {
    let small = make_doc(10); // ~0.6k
    let large = make_doc(1000); // ~60k
    let relaxed = small.replace('"', "'");

    let mut g = c.benchmark_group("json");

    g.bench_function("parse_strict_small", |b| {
        b.iter(|| Document::parse(black_box(&small), Mode::Strict))
    });
    g.bench_function("parse_strict_large", |b| {
        b.iter(|| Document::parse(black_box(&large), Mode::Strict))
    });
    g.bench_function("parse_relaxed_small", |b| {
        b.iter(|| Document::parse(black_box(&relaxed), Mode::Relaxed))
    });

    let doc = Document::parse(&large, Mode::Strict).unwrap();
    g.bench_function("get_last_port", |b| {
        b.iter(|| doc.get(black_box("device.ports[999].name")))
    });
    g.bench_function("find_key_late", |b| {
        b.iter(|| doc.find_key(black_box("device.ports[].caps"), 900, usize::MAX))
    });

    let mut overrides = Overrides::new();
    overrides.set("device.vendor", "\"other\"");
    g.bench_function("dump_large", |b| b.iter(|| doc.dump(black_box(&overrides))));
    g.bench_function("xml_large", |b| b.iter(|| doc.to_xml(None)));

    g.finish();
}

fn bench_script(c: &mut Criterion) {
    let mut g = c.benchmark_group("script");

    g.bench_function("tokenize", |b| {
        b.iter(|| tokenize(black_box("call label 'has space' \"it's\" plain ; comment")))
    });

    let src = "\
setlocal i 0
:top
if ${len:${get:pad}} >= 50 goto end
setlocal pad ${get:pad}x
goto top
:end
";
    g.bench_function("loop_50", |b| {
        b.iter(|| {
            let mut interp = Interpreter::new();
            interp.run_source("bench", black_box(src), vec![]);
        })
    });

    g.finish();
}

criterion_group!(benches, bench_json, bench_script);
criterion_main!(benches);
