use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use slotec::{Class, ComponentManager, Entity, PoolBackend, PoolConfig, Pod, Registry};

#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Speed {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone)]
pub struct Name {
    name: String,
}

fn spawn(registry: &mut Registry, count: usize) -> Vec<Entity> {
    (0..count).map(|_| registry.create_entity()).collect()
}

fn despawn(registry: &mut Registry, entities: Vec<Entity>) {
    for e in entities {
        registry.destroy_entity(e).unwrap();
    }
}

fn attach_detach_pod(c: &mut Criterion) {
    let mut group = c.benchmark_group("attach_detach_pod");
    for backend in [PoolBackend::Dense, PoolBackend::Keyed] {
        for size in [1_000usize, 10_000] {
            group.throughput(Throughput::Elements(size as u64));
            group.bench_with_input(BenchmarkId::new(format!("{backend:?}"), size), &size, |b, &size| {
                let mut registry = Registry::new();
                let config = PoolConfig::default().with_backend(backend);
                let mut speeds: ComponentManager<Speed, Pod> = ComponentManager::with_config(&mut registry, &config);
                let mut entities = spawn(&mut registry, size);
                b.iter(|| {
                    for e in entities.iter_mut() {
                        speeds.add_component_to(e, 0).unwrap();
                    }
                    for e in entities.iter_mut().rev() {
                        speeds.remove_component_from(e, 0);
                    }
                });
                black_box(speeds.pool().total_slot_count());
                despawn(&mut registry, entities);
            });
        }
    }
    group.finish();
}

fn attach_detach_class(c: &mut Criterion) {
    let mut group = c.benchmark_group("attach_detach_class");
    let size = 10_000usize;
    group.throughput(Throughput::Elements(size as u64));
    group.bench_function("construct", |b| {
        let mut registry = Registry::new();
        let mut names: ComponentManager<Name, Class> = ComponentManager::new(&mut registry);
        let mut entities = spawn(&mut registry, size);
        b.iter(|| {
            for (i, e) in entities.iter_mut().enumerate() {
                names.add_component_to(e, 0).unwrap();
                names.construct_component(e, 0, Name { name: format!("entity {i}") });
            }
            for e in entities.iter_mut() {
                black_box(names.remove_component_from(e, 0));
            }
        });
        despawn(&mut registry, entities);
    });
    group.finish();
}

fn iterate_owners(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate_owners");
    for size in [1_000usize, 10_000, 100_000] {
        let mut registry = Registry::new();
        let mut speeds: ComponentManager<Speed, Pod> = ComponentManager::new(&mut registry);
        let mut entities = spawn(&mut registry, size);
        // every other entity holds the component
        for e in entities.iter_mut().step_by(2) {
            speeds.add_component_to(e, 0).unwrap();
        }
        group.throughput(Throughput::Elements(size as u64 / 2));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let sum: u32 = speeds.get_owners(0).iter().map(|id| id.index()).sum();
                black_box(sum)
            });
        });
        for e in entities.iter_mut().step_by(2) {
            speeds.remove_component_from(e, 0);
        }
        despawn(&mut registry, entities);
    }
    group.finish();
}

criterion_group!(benches, attach_detach_pod, attach_detach_class, iterate_owners);
criterion_main!(benches);
