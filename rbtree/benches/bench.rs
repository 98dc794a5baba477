use core::hint::black_box;
use core::time::Duration;
use std::collections::BTreeSet;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rbtree::{BinarySearchTree, RedBlackTree};

const SIZES: [usize; 3] = [100, 1_000, 10_000];

pub fn gen_random_ints(count: usize) -> Vec<i32> {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    (0..count).map(|_| rng.gen_range(0..i32::MAX)).collect()
}

pub fn gen_ascending_ints(count: usize) -> Vec<i32> {
    (0..count as i32).collect()
}

fn insert(c: &mut Criterion) {
    let mut g = c.benchmark_group("insert");

    macro_rules! bench {
        ($name:expr, $input:expr, $count:expr, $tree:ty) => {
            g.bench_with_input(BenchmarkId::new($name, $count), &$input, |b, keys| {
                b.iter(|| {
                    let mut tree = <$tree>::new();
                    for &x in keys {
                        tree.insert(x);
                    }
                    tree
                })
            });
        };
    }

    for count in SIZES {
        let random = gen_random_ints(count);
        bench!("rbtree_random", random, count, RedBlackTree<i32>);
        bench!("bst_random", random, count, BinarySearchTree<i32>);
        bench!("btreeset_random", random, count, BTreeSet<i32>);

        let ascending = gen_ascending_ints(count);
        bench!("rbtree_ascending", ascending, count, RedBlackTree<i32>);
        bench!("btreeset_ascending", ascending, count, BTreeSet<i32>);
        // the unbalanced tree degenerates into a chain here, keep it small
        if count <= 1_000 {
            bench!("bst_ascending", ascending, count, BinarySearchTree<i32>);
        }
    }
}

fn lookup(c: &mut Criterion) {
    let mut g = c.benchmark_group("lookup");
    let mut rng = ChaCha8Rng::seed_from_u64(2);

    for count in SIZES {
        let keys = gen_random_ints(count);
        let mut probes = keys.clone();
        probes.shuffle(&mut rng);

        let rbt: RedBlackTree<i32> = keys.iter().copied().collect();
        g.bench_with_input(BenchmarkId::new("rbtree", count), &probes, |b, probes| {
            b.iter(|| probes.iter().filter(|k| rbt.contains(black_box(*k))).count())
        });

        let bst: BinarySearchTree<i32> = keys.iter().copied().collect();
        g.bench_with_input(BenchmarkId::new("bst", count), &probes, |b, probes| {
            b.iter(|| probes.iter().filter(|k| bst.contains(black_box(*k))).count())
        });

        let set: BTreeSet<i32> = keys.iter().copied().collect();
        g.bench_with_input(BenchmarkId::new("btreeset", count), &probes, |b, probes| {
            b.iter(|| probes.iter().filter(|k| set.contains(black_box(*k))).count())
        });
    }
}

fn delete(c: &mut Criterion) {
    let mut g = c.benchmark_group("delete");
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    for count in SIZES {
        let keys = gen_random_ints(count);
        let mut order = keys.clone();
        order.shuffle(&mut rng);
        let rbt: RedBlackTree<i32> = keys.iter().copied().collect();

        g.bench_with_input(BenchmarkId::new("rbtree", count), &order, |b, order| {
            b.iter_batched(
                || rbt.iter().copied().collect::<RedBlackTree<i32>>(),
                |mut tree| {
                    for k in order {
                        tree.delete(k);
                    }
                    tree
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(3));
    targets = insert, lookup, delete
);
criterion_main!(benches);
