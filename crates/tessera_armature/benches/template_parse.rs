//! Template parse benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tessera_armature::{parse_markup, parse_template};
use tessera_relief::{Namespace, ParserOptions};

const LIST_ITEM: [&str; 5] = [
    "<li class=",
    " @click=",
    ">\n  <span class=\"label\">",
    "</span>\n  <button .disabled=",
    ">remove</button>\n</li>",
];

const PAGE: &str = r#"<!DOCTYPE html>
<main id="app">
  <header><h1>Title &amp; subtitle</h1></header>
  <section>
    <p>Lorem ipsum dolor sit amet, consectetur adipiscing elit.</p>
    <ul><li>one</li><li>two</li><li>three</li></ul>
    <textarea>raw &lt;text&gt;</textarea>
    <svg viewBox="0 0 10 10"><circle cx="5" cy="5" r="4"/></svg>
  </section>
</main>"#;

fn benchmark_parse_template(c: &mut Criterion) {
    let options = ParserOptions::default();

    c.bench_function("parse_template_list_item", |b| {
        b.iter(|| parse_template(black_box(&LIST_ITEM), &options));
    });
}

fn benchmark_parse_markup(c: &mut Criterion) {
    let options = ParserOptions::default();

    c.bench_function("parse_markup_page", |b| {
        b.iter(|| parse_markup(black_box(PAGE), Namespace::Html, &options));
    });
}

criterion_group!(benches, benchmark_parse_template, benchmark_parse_markup);
criterion_main!(benches);
