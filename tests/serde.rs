#![cfg(feature = "use_serde")]

use slotec::{IdAllocator, PoolBackend, PoolConfig, SlotPool};

#[test]
fn pool_config_round_trip() {
    let config = PoolConfig::default()
        .with_backend(PoolBackend::Keyed)
        .with_initial_capacity(64)
        .with_max_slots(1024);
    let bytes = bincode::serialize(&config).unwrap();
    let restored: PoolConfig = bincode::deserialize(&bytes).unwrap();
    assert_eq!(restored, config);

    let pool: SlotPool<u64> = SlotPool::with_config(&restored);
    assert_eq!(pool.backend(), PoolBackend::Keyed);
}

#[test]
/// A restored allocator continues exactly where the snapshot left off.
fn id_allocator_snapshot() {
    let mut ids = IdAllocator::new();
    for _ in 0..6 {
        ids.get();
    }
    ids.put(4).unwrap();
    ids.put(1).unwrap();

    let bytes = bincode::serialize(&ids).unwrap();
    let mut restored: IdAllocator = bincode::deserialize(&bytes).unwrap();
    assert_eq!(restored, ids);
    assert_eq!(restored.free_ids(), &[1, 4]);
    assert_eq!(restored.get(), 4);
    assert_eq!(restored.get(), 1);
    assert_eq!(restored.get(), 6);
}
