//! Benchmarks for the agent scoring and selection hot path.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use crucible::domain::models::{Complexity, FeatureContext, OrchestrationContext};
use crucible::services::agent_registry::{score, AgentRegistry};

fn selection_context() -> OrchestrationContext {
    let feature = FeatureContext::new("Patient Billing Export", "api-endpoint", Complexity::High)
        .with_requirements([
            "implement billing export endpoint",
            "security review of the export path",
            "coverage for edge cases",
            "architecture notes for the billing module",
        ]);
    OrchestrationContext::from_feature(&feature)
}

fn bench_score(c: &mut Criterion) {
    let registry = AgentRegistry::with_defaults();
    let context = selection_context();
    let agent = registry.select_optimal(&context).remove(0);

    c.bench_function("score_single_agent", |b| {
        b.iter(|| score(black_box(&agent), black_box(&context)));
    });
}

fn bench_select_optimal(c: &mut Criterion) {
    let registry = AgentRegistry::with_defaults();
    let context = selection_context();

    c.bench_function("select_optimal_default_registry", |b| {
        b.iter(|| registry.select_optimal(black_box(&context)));
    });
}

fn bench_recommended_workflow(c: &mut Criterion) {
    let registry = AgentRegistry::with_defaults();
    let context = selection_context();

    c.bench_function("recommended_workflow", |b| {
        b.iter(|| registry.recommended_workflow(black_box(&context)));
    });
}

criterion_group!(
    benches,
    bench_score,
    bench_select_optimal,
    bench_recommended_workflow
);
criterion_main!(benches);
