// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Tests for copy-on-write sharing between builders and snapshots.
//!
//! Every snapshot taken along the way must keep exactly the items it had when
//! it was built, no matter what later builders do to shared nodes.

use std::collections::BTreeSet;
use std::sync::Arc;

use bough::{Builder, FreeList, Snapshot};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

// =============================================================================
// Helper functions
// =============================================================================

fn perm(n: u32, seed: u64) -> Vec<u32> {
    let mut out: Vec<u32> = (0..n).collect();
    out.shuffle(&mut StdRng::seed_from_u64(seed));
    return out;
}

fn all(tree: &Snapshot<u32>) -> Vec<u32> {
    let mut out = Vec::new();
    tree.ascend(|item| {
        out.push(*item);
        return true;
    });
    return out;
}

fn sorted(items: &[u32]) -> Vec<u32> {
    let mut out = items.to_vec();
    out.sort_unstable();
    return out;
}

fn empty(degree: usize) -> Snapshot<u32> {
    return Snapshot::new(degree).unwrap();
}

// =============================================================================
// Snapshots taken during a build
// =============================================================================

#[test]
fn snapshots_taken_while_inserting_and_deleting() {
    const SIZE: u32 = 1024;
    const STEP: usize = 32;
    let mut builder = Builder::new(&empty(4));

    for round in 0..10u64 {
        assert_eq!(builder.min(), None);
        assert_eq!(builder.max(), None);

        let mut trees = Vec::new();
        let order = perm(SIZE, round);
        for (i, item) in order.iter().enumerate() {
            if i % STEP == 0 {
                trees.push(builder.build());
            }
            assert_eq!(builder.replace_or_insert(*item), None, "insert found {item}");
        }
        for item in perm(SIZE, round + 100) {
            assert_eq!(builder.replace_or_insert(item), Some(item));
        }

        let full = builder.build();
        assert_eq!(full.min(), Some(&0));
        assert_eq!(full.max(), Some(&(SIZE - 1)));
        assert_eq!(all(&full), (0..SIZE).collect::<Vec<_>>());
        for (i, partial) in trees.iter().enumerate() {
            assert_eq!(all(partial), sorted(&order[..i * STEP]));
            assert_eq!(partial.validate(), Ok(()));
        }

        builder.set(&full);
        let mut trees = Vec::new();
        let order = perm(SIZE, round + 200);
        for (i, item) in order.iter().enumerate() {
            if i % STEP == 0 {
                trees.push(builder.build());
            }
            assert_eq!(builder.delete(item), Some(*item), "didn't find {item}");
        }
        for (i, partial) in trees.iter().enumerate() {
            let removed: BTreeSet<u32> = order[..i * STEP].iter().copied().collect();
            let want: Vec<u32> = (0..SIZE).filter(|item| !removed.contains(item)).collect();
            assert_eq!(all(partial), want);
        }
        assert_eq!(all(&full), (0..SIZE).collect::<Vec<_>>());
        assert!(all(&builder).is_empty());
    }
}

#[test]
fn builder_reuse_across_sets() {
    let mut builder = Builder::new(&empty(3));
    for i in (0..1000).step_by(2) {
        builder.replace_or_insert(i);
    }
    let twos = builder.build();

    for i in (0..1000).step_by(4) {
        builder.delete(&i);
    }
    for i in (5..1000).step_by(10) {
        builder.replace_or_insert(i);
    }
    let minus_fours_plus_odd_fives = builder.build();

    builder.set(&twos);
    for i in (0..1000).step_by(6) {
        builder.delete(&i);
    }
    for i in (7..1000).step_by(14) {
        builder.replace_or_insert(i);
    }
    let minus_sixes_plus_odd_sevens = builder.build();

    let want: Vec<u32> = (0..1000).step_by(2).collect();
    assert_eq!(twos.len(), want.len());
    assert_eq!(all(&twos), want);

    let mut want: Vec<u32> = (2..1000).step_by(4).chain((5..1000).step_by(10)).collect();
    want.sort_unstable();
    assert_eq!(minus_fours_plus_odd_fives.len(), want.len());
    assert_eq!(all(&minus_fours_plus_odd_fives), want);

    let mut want: Vec<u32> = (2..1000)
        .step_by(2)
        .filter(|i| i % 6 != 0)
        .chain((7..1000).step_by(14))
        .collect();
    want.sort_unstable();
    assert_eq!(minus_sixes_plus_odd_sevens.len(), want.len());
    assert_eq!(all(&minus_sixes_plus_odd_sevens), want);
}

// =============================================================================
// Many variants from one base
// =============================================================================

#[test]
fn insert_into_variants_of_one_base() {
    const SIZE: u32 = 10_000;
    const BATCH: usize = 100;

    let evens: Vec<u32> = perm(SIZE, 1).into_iter().map(|i| i * 2).collect();
    let mut builder = Builder::new(&empty(32));
    for item in &evens {
        builder.replace_or_insert(*item);
    }
    let base = builder.build();

    let mut variants = Vec::new();
    for seed in 0..10u64 {
        let batch: Vec<u32> = perm(SIZE, seed + 10).into_iter().map(|i| i * 2 + 1).take(BATCH).collect();
        let mut builder = Builder::new(&base);
        for item in &batch {
            builder.replace_or_insert(*item);
        }
        variants.push((batch, builder.build()));
    }

    for (batch, tree) in &variants {
        let mut want = evens.clone();
        want.extend(batch);
        want.sort_unstable();
        assert_eq!(all(tree), want);
        assert_eq!(tree.len(), SIZE as usize + BATCH);
    }
    assert_eq!(all(&base), sorted(&evens));
    assert_eq!(base.len(), SIZE as usize);
}

#[test]
fn delete_from_variants_of_one_base() {
    const SIZE: u32 = 10_000;
    const BATCH: usize = 100;

    let mut builder = Builder::new(&empty(32));
    for item in perm(SIZE, 3) {
        builder.replace_or_insert(item);
    }
    let base = builder.build();

    let mut variants = Vec::new();
    for seed in 0..10u64 {
        let batch: Vec<u32> = perm(SIZE, seed + 20).into_iter().take(BATCH).collect();
        let mut builder = Builder::new(&base);
        for item in &batch {
            builder.delete(item);
        }
        variants.push((batch, builder.build()));
    }

    for (batch, tree) in &variants {
        let removed: BTreeSet<u32> = batch.iter().copied().collect();
        let want: Vec<u32> = (0..SIZE).filter(|item| !removed.contains(item)).collect();
        assert_eq!(all(tree), want);
        assert_eq!(tree.len(), SIZE as usize - BATCH);
        assert_eq!(tree.validate(), Ok(()));
    }
    assert_eq!(all(&base), (0..SIZE).collect::<Vec<_>>());
}

#[test]
fn two_builders_from_one_snapshot_are_isolated() {
    let mut builder = Builder::new(&empty(2));
    for item in 0..100 {
        builder.replace_or_insert(item);
    }
    let base = builder.build();

    let mut left = Builder::new(&base);
    let mut right = Builder::new(&base);
    for item in (0..100).filter(|i| i % 2 == 0) {
        left.delete(&item);
    }
    for item in 100..150 {
        right.replace_or_insert(item);
    }
    right.delete_min();

    assert_eq!(all(&base), (0..100).collect::<Vec<_>>());
    assert_eq!(all(&left), (0..100).filter(|i| i % 2 == 1).collect::<Vec<_>>());
    assert_eq!(all(&right), (1..150).collect::<Vec<_>>());
}

// =============================================================================
// Delete min / max through a builder
// =============================================================================

#[test]
fn delete_min_leaves_snapshot_whole() {
    let mut builder = Builder::new(&empty(3));
    for item in perm(100, 5) {
        builder.replace_or_insert(item);
    }
    let full = builder.build();
    let mut got = Vec::new();
    while let Some(item) = builder.delete_min() {
        got.push(item);
    }
    let drained = builder.build();

    assert_eq!(got, (0..100).collect::<Vec<_>>());
    assert_eq!(all(&full), (0..100).collect::<Vec<_>>());
    assert!(all(&drained).is_empty());
}

#[test]
fn delete_max_leaves_snapshot_whole() {
    let mut builder = Builder::new(&empty(3));
    for item in perm(100, 6) {
        builder.replace_or_insert(item);
    }
    let full = builder.build();
    let mut got = Vec::new();
    while let Some(item) = builder.delete_max() {
        got.push(item);
    }
    got.reverse();

    assert_eq!(got, (0..100).collect::<Vec<_>>());
    assert_eq!(all(&full), (0..100).collect::<Vec<_>>());
}

// =============================================================================
// Pools and threads
// =============================================================================

#[test]
fn builders_share_a_pool() {
    let free_list = Arc::new(FreeList::new(128));
    let mut builder = Builder::with_free_list(&empty(2), free_list.clone());
    for item in 0..200 {
        builder.replace_or_insert(item);
    }
    builder.clear(true);
    assert!(!free_list.is_empty());

    let other = Builder::with_free_list(&empty(2), free_list.clone());
    assert!(Arc::ptr_eq(other.free_list(), builder.free_list()));
}

#[test]
fn snapshots_are_readable_from_other_threads() {
    let mut builder = Builder::new(&empty(4));
    for item in 0..1000 {
        builder.replace_or_insert(item);
    }
    let snapshot = builder.build();
    for item in 0..500 {
        builder.delete(&item);
    }

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let snapshot = snapshot.clone();
            std::thread::spawn(move || snapshot.iter().copied().sum::<u32>())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), (0..1000).sum::<u32>());
    }
    assert_eq!(builder.len(), 500);
}
