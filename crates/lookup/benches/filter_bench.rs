//! Alternative filter benchmarks
//!
//! Measures the per-candidate filters and a full result-list filter pass.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use shelfscan_core::types::Product;
use shelfscan_lookup::{
    AlternativesConfig, SortKey, derive_category_tag, filter_candidates, is_distributed_in_region,
    is_sold_at_retailer, is_valid_grade,
};

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_owned()).collect()
}

fn create_candidate(i: usize) -> Product {
    // every third candidate is foreign, every fifth has no grade
    let countries = if i % 3 == 0 {
        tags(&["en:france", "en:germany"])
    } else {
        tags(&["en:germany", "en:switzerland"])
    };
    Product {
        code: format!("76100000{i:05}"),
        product_name: Some(format!("Product {i}")),
        nutriscore_grade: Some(if i % 5 == 0 { "unknown" } else { "b" }.to_owned()),
        ecoscore_grade: Some("c".to_owned()),
        categories_tags: tags(&["en:foods", "en:spreads", "en:nut-spreads"]),
        countries_tags: countries,
        stores_tags: tags(&["ch:migros", "ch:coop-pronto"]),
        stores: Some("Migros, Coop Pronto".to_owned()),
        ..Default::default()
    }
}

fn bench_predicates(c: &mut Criterion) {
    let config = AlternativesConfig::default();
    let product = create_candidate(1);
    let mut group = c.benchmark_group("predicates");

    group.bench_function("is_valid_grade", |b| {
        b.iter(|| is_valid_grade(black_box(Some("Not-Applicable"))))
    });

    group.bench_function("is_distributed_in_region", |b| {
        b.iter(|| {
            is_distributed_in_region(
                black_box(&product.countries_tags),
                black_box(&product.purchase_places_tags),
                &config.region,
            )
        })
    });

    group.bench_function("is_sold_at_retailer/tag", |b| {
        b.iter(|| {
            is_sold_at_retailer(
                black_box(&product.stores_tags),
                black_box(product.stores.as_deref()),
                &config.retailer,
            )
        })
    });

    group.bench_function("is_sold_at_retailer/free_text", |b| {
        b.iter(|| is_sold_at_retailer(black_box(&[]), black_box(Some("Manor, Coop City")), &config.retailer))
    });

    group.bench_function("derive_category_tag", |b| {
        b.iter(|| derive_category_tag(black_box(&product.categories_tags)))
    });

    group.finish();
}

fn bench_filter_candidates(c: &mut Criterion) {
    let config = AlternativesConfig::default();
    let mut group = c.benchmark_group("filter_candidates");

    for size in [5usize, 20, 100] {
        let candidates: Vec<Product> = (0..size).map(create_candidate).collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &candidates, |b, candidates| {
            b.iter(|| {
                filter_candidates(
                    black_box(candidates.clone()),
                    "7610000000001",
                    SortKey::Nutrition,
                    &config.region,
                    &config.retailer,
                )
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_predicates, bench_filter_candidates);
criterion_main!(benches);
