use murmur_core::host::RecordingHost;
use murmur_core::pool::EffectPool;
use murmur_data::{EffectKind, Vec3};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Acquire { kind: usize, ttl: u64 },
    Sweep,
    Invalidate(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..5, 1u64..200).prop_map(|(kind, ttl)| Op::Acquire { kind, ttl }),
        3 => Just(Op::Sweep),
        1 => (0usize..64).prop_map(Op::Invalidate),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn test_capacity_is_never_exceeded(
        capacity in 1usize..8,
        grace in 0u64..100,
        recycle in any::<bool>(),
        ops in prop::collection::vec(arb_op(), 1..120)
    ) {
        let mut host = RecordingHost::new();
        let mut pool = EffectPool::new(capacity, grace, recycle);
        let mut now = 0u64;

        for op in ops {
            now += 17;
            match op {
                Op::Acquire { kind, ttl } => {
                    let _ = pool.acquire(&mut host, EffectKind::ALL[kind], Vec3::ZERO, Vec3::ZERO, ttl, now);
                }
                Op::Sweep => {
                    pool.sweep(&mut host, now);
                }
                Op::Invalidate(i) => {
                    if let Some(effect) = pool.live().get(i % pool.live().len().max(1)) {
                        host.invalidate(effect.external_id);
                    }
                }
            }
            let stats = pool.stats();
            prop_assert!(stats.live + stats.free <= capacity,
                "{} live + {} free > {}", stats.live, stats.free, capacity);
        }
    }
}
