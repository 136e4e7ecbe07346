use criterion::{black_box, criterion_group, criterion_main, Criterion};
use murmur_core::config::SimConfig;
use murmur_core::host::RecordingHost;
use murmur_core::scheduler::RoundRobinScheduler;
use murmur_core::Simulation;

fn bench_scheduler_update(c: &mut Criterion) {
    let mut scheduler: RoundRobinScheduler<u32, u64> = RoundRobinScheduler::new(100);
    for key in 0..1000u32 {
        scheduler.set(
            key,
            Box::new(move |total: &mut u64| {
                *total += u64::from(key);
                Ok(())
            }),
            None,
        );
    }

    c.bench_function("scheduler_update_budget_100_of_1000", |b| {
        let mut total = 0u64;
        b.iter(|| black_box(scheduler.update_with(&mut total)))
    });
}

fn bench_scheduler_churn(c: &mut Criterion) {
    c.bench_function("scheduler_set_delete_100", |b| {
        b.iter(|| {
            let mut scheduler: RoundRobinScheduler<u32> = RoundRobinScheduler::new(10);
            for key in 0..100u32 {
                scheduler.set(key, Box::new(|_: &mut ()| Ok(())), None);
            }
            scheduler.update();
            for key in (0..100u32).step_by(2) {
                scheduler.delete(&key);
            }
            black_box(scheduler.len())
        })
    });
}

fn bench_simulation_tick(c: &mut Criterion) {
    let mut config = SimConfig::default();
    config.swarm.initial_entities = 500;
    config.swarm.seed = Some(42);
    let mut sim = Simulation::new(config, RecordingHost::new()).expect("valid config");

    c.bench_function("simulation_tick_500_entities", |b| {
        b.iter(|| black_box(sim.tick()))
    });
}

criterion_group!(
    benches,
    bench_scheduler_update,
    bench_scheduler_churn,
    bench_simulation_tick
);
criterion_main!(benches);
