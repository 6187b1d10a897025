//! Throughput benchmarks for the bounded-wait queue and the pool's
//! submit/dispatch path.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;
use std::thread;

use dynapool::core::BoundedWaitQueue;
use dynapool::{Pool, PoolConfig};

fn bench_queue_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_push_pop");

    for size in [100u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let q = BoundedWaitQueue::new();
                for i in 0..size {
                    q.push(i).unwrap();
                }
                for _ in 0..size {
                    black_box(q.pop().unwrap());
                }
            });
        });
    }
    group.finish();
}

fn bench_queue_contended_multi_consumer(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_contended_multi_consumer");

    for consumers in [2usize, 4, 8] {
        group.bench_with_input(
            BenchmarkId::from_parameter(consumers),
            &consumers,
            |b, &consumers| {
                b.iter(|| {
                    let q = Arc::new(BoundedWaitQueue::new());
                    for i in 0..1_000u64 {
                        q.push(i).unwrap();
                    }
                    q.close();
                    let handles: Vec<_> = (0..consumers)
                        .map(|_| {
                            let q = Arc::clone(&q);
                            thread::spawn(move || {
                                let mut n = 0u64;
                                while q.pop().is_ok() {
                                    n += 1;
                                }
                                n
                            })
                        })
                        .collect();
                    let total: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
                    black_box(total);
                });
            },
        );
    }
    group.finish();
}

fn bench_pool_submit_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_submit_dispatch");

    for task_count in [100u64, 1_000] {
        group.throughput(Throughput::Elements(task_count));
        group.bench_with_input(
            BenchmarkId::from_parameter(task_count),
            &task_count,
            |b, &task_count| {
                b.iter(|| {
                    let pool = Pool::new(PoolConfig::new().with_upper_limit(8)).unwrap();
                    let handles: Vec<_> = (0..task_count)
                        .map(|i| pool.submit(move || i * 2).unwrap())
                        .collect();
                    for h in handles {
                        black_box(h.join().unwrap());
                    }
                    pool.stop();
                    pool.join();
                });
            },
        );
    }
    group.finish();
}

fn bench_pool_grow_shrink(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_grow_shrink");

    group.bench_function("grow_then_shrink", |b| {
        b.iter(|| {
            let pool = Pool::new(PoolConfig::new()).unwrap();
            pool.set_lower_limit(8).unwrap();
            black_box(pool.workers_count());
            pool.set_upper_limit(2).unwrap();
            black_box(pool.workers_count());
            pool.stop();
            pool.join();
        });
    });
    group.finish();
}

criterion_group!(
    queue_benches,
    bench_queue_push_pop,
    bench_queue_contended_multi_consumer
);

criterion_group!(pool_benches, bench_pool_submit_dispatch, bench_pool_grow_shrink);

criterion_main!(queue_benches, pool_benches);
