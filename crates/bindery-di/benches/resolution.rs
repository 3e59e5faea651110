//! Benchmark: resolution paths (instance, provider, singleton hit, curried factory)

use bindery_di::{Binding, Container, ContextTranslator, Query};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;

// Benchmark fixture: service built from two dependencies
#[allow(dead_code)]
struct Repository {
	dsn: Arc<String>,
	pool_size: Arc<u32>,
}

struct Tenant(u32);
struct Shard(u32);

fn container() -> Container {
	Container::builder()
		.bind(Binding::instance(String::from("postgres://localhost/bench")))
		.bind(Binding::instance(16u32))
		.bind(Binding::provider(|r| {
			Ok(Repository {
				dsn: r.instance()?,
				pool_size: r.instance()?,
			})
		}))
		.bind(
			Binding::provider(|r| {
				Ok(Repository {
					dsn: r.instance()?,
					pool_size: r.instance()?,
				})
			})
			.tagged("cached")
			.singleton(),
		)
		.bind(Binding::factory(|_, (a, b, c): (u64, u64, u64)| Ok(a ^ b ^ c)))
		.bind(Binding::contexted_provider(|_, shard: &Shard| Ok(shard.0 as u64 * 2)).tagged("shard"))
		.translate(ContextTranslator::new(|tenant: &Tenant| Ok(Shard(tenant.0 % 4))))
		.build()
}

fn benchmark_instance(c: &mut Criterion) {
	let container = container();

	c.bench_function("instance_binding", |b| {
		b.iter(|| black_box(container.instance::<String>().unwrap()))
	});
}

fn benchmark_provider_vs_singleton(c: &mut Criterion) {
	let container = container();
	container.tagged::<Repository>("cached").unwrap();

	c.bench_function("provider_with_dependencies", |b| {
		b.iter(|| black_box(container.instance::<Repository>().unwrap()))
	});

	c.bench_function("singleton_cache_hit", |b| {
		b.iter(|| black_box(container.tagged::<Repository>("cached").unwrap()))
	});
}

fn benchmark_currying(c: &mut Criterion) {
	let container = container();
	let factory = container.factory::<u64>().unwrap();

	c.bench_function("factory_single_call", |b| {
		b.iter(|| black_box(factory.call((1u64, 2u64, 3u64)).unwrap()))
	});

	c.bench_function("factory_partial_chain", |b| {
		b.iter(|| {
			let partial = factory.apply((1u64,)).unwrap().into_partial().unwrap();
			black_box(partial.call((2u64, 3u64)).unwrap())
		})
	});
}

fn benchmark_context_translation(c: &mut Criterion) {
	let container = container();

	c.bench_function("translated_context", |b| {
		b.iter(|| {
			black_box(
				container
					.on(Tenant(7))
					.instance_with::<u64>(Query::tagged("shard"))
					.unwrap(),
			)
		})
	});
}

criterion_group!(
	benches,
	benchmark_instance,
	benchmark_provider_vs_singleton,
	benchmark_currying,
	benchmark_context_translation
);
criterion_main!(benches);
