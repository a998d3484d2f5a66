use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use firebird_diag_parser::{LogParser, parse_log_from_str, parse_report_from_str};
use firebird_diag_parser::tools::is_entry_start_line;

// 生成 gstat 报告：每张表带一个索引
fn generate_report(num_tables: usize) -> String {
    let mut text = String::from(
        "Database header page information:\n        System Change Number    24\n        Page size               8192\n\nAnalyzing database pages ...\n",
    );
    for i in 0..num_tables {
        text.push_str(&format!(
            "TABLE_{i} ({id})\n    Primary pointer page: {p}, Index root page: {r}\n    Data pages: {i}, average fill: 57%\n    Fill distribution:\n         0 - 19% = 0\n        20 - 39% = 1\n        40 - 59% = 0\n        60 - 79% = 0\n        80 - 99% = {i}\n\n",
            id = i + 128,
            p = i * 4,
            r = i * 4 + 1,
        ));
        text.push_str(&format!(
            "    Index PK_{i} (0)\n        Root page: {root}, depth: 1, leaf buckets: 1, nodes: {i}\n        Average node length: 10.44, total dup: 0, max dup: 0\n        Clustering factor: 1, ratio: 0.06\n\n",
            root = i * 4 + 2,
        ));
    }
    text
}

// 生成服务器日志
fn generate_log(num_entries: usize) -> String {
    let mut text = String::new();
    for i in 0..num_entries {
        text.push_str(&format!(
            "SRVDB1  Tue Apr 04 21:{:02}:{:02} 2017\n        INET/inet_error: read errno = {}\n\n\n",
            (i / 60) % 60,
            i % 60,
            10054 + i
        ));
    }
    text
}

fn benchmark_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("report");

    for size in [10, 100, 1000].iter() {
        let text = generate_report(*size);
        group.bench_with_input(
            BenchmarkId::new("parse_report_from_str", size),
            &text,
            |b, text| b.iter(|| black_box(parse_report_from_str(black_box(text)))),
        );
    }

    group.finish();
}

fn benchmark_log(c: &mut Criterion) {
    let mut group = c.benchmark_group("log");

    for size in [10, 100, 1000, 10000].iter() {
        let text = generate_log(*size);
        group.bench_with_input(
            BenchmarkId::new("parse_log_from_str", size),
            &text,
            |b, text| b.iter(|| black_box(parse_log_from_str(black_box(text)))),
        );

        group.bench_with_input(BenchmarkId::new("LogParser::parse", size), &text, |b, text| {
            b.iter(|| {
                let mut parser = LogParser::new();
                black_box(parser.parse(text.lines()).count())
            })
        });
    }

    group.finish();
}

fn benchmark_entry_start_line(c: &mut Criterion) {
    let lines = [
        "SRVDB1  Tue Apr 04 21:25:40 2017",
        "MyServer (Server)\tFri Apr  6 16:55:23 2018",
        "        INET/inet_error: read errno = 10054",
        "OIT 551120654, OAT 551120655, OST 551120655, Next 551121770",
    ];

    c.bench_function("is_entry_start_line", |b| {
        b.iter(|| {
            for line in &lines {
                black_box(is_entry_start_line(black_box(line)));
            }
        })
    });
}

criterion_group!(benches, benchmark_report, benchmark_log, benchmark_entry_start_line);
criterion_main!(benches);
