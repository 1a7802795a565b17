use criterion::{black_box, criterion_group, criterion_main, Criterion};

use aieval_core::matcher::missing_questions;
use aieval_core::segment::segment;

fn generate_submission(questions: usize) -> String {
    let mut s = String::from("Name: Bench Student\nRoll No: 42\n\n");
    for i in 1..=questions {
        let marker = match i % 3 {
            0 => format!("Q{i})"),
            1 => format!("{i}."),
            _ => format!("{i}:"),
        };
        s.push_str(&format!(
            "{marker} The answer to question {i} discusses scattering, \
             wavelengths and the atmosphere in several sentences.\n\
             It continues on a second line with 3.14 and other numbers.\n\n"
        ));
    }
    s
}

fn bench_segment(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment");

    let small = generate_submission(5);
    let medium = generate_submission(30);
    let large = generate_submission(99);
    let unmarked = "plain prose without any question markers ".repeat(500);

    group.bench_function("5_questions", |b| b.iter(|| segment(black_box(&small))));
    group.bench_function("30_questions", |b| b.iter(|| segment(black_box(&medium))));
    group.bench_function("99_questions", |b| b.iter(|| segment(black_box(&large))));
    group.bench_function("no_markers", |b| b.iter(|| segment(black_box(&unmarked))));

    group.finish();
}

fn bench_match(c: &mut Criterion) {
    let key = segment(&generate_submission(99));
    let partial = segment(&generate_submission(50));

    c.bench_function("missing_questions_99", |b| {
        b.iter(|| missing_questions(black_box(&key), black_box(&partial)))
    });
}

criterion_group!(benches, bench_segment, bench_match);
criterion_main!(benches);
