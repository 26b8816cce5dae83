use criterion::measurement::WallTime;
use criterion::{BenchmarkGroup, Criterion, criterion_group, criterion_main};
use mqueue_broker::{BlockingQueue, LockFreeQueue, Queue, State};
use std::hint::black_box;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

fn bench_lockfree_queue(c: &mut Criterion) {
    let mut group: BenchmarkGroup<WallTime> = c.benchmark_group("lockfree_queue");

    group.bench_function("push_pop_single_thread", |b| {
        let queue: LockFreeQueue<i64> = LockFreeQueue::new(1024).unwrap();

        b.iter(|| {
            queue.try_push(black_box(42));
            queue.pop();
        });
    });

    group.bench_function("push_single_thread", |b| {
        let queue: LockFreeQueue<i64> = LockFreeQueue::new(1024).unwrap();
        let mut i = 0;

        b.iter(|| {
            if queue.try_push(black_box(i)) == State::Ok {
                i += 1;
            } else {
                while queue.pop().is_some() {}
                i = 0;
            }
        });
    });

    group.bench_function("spsc_threaded", |b| {
        b.iter(|| {
            let queue: Arc<LockFreeQueue<i64>> = Arc::new(LockFreeQueue::new(1024).unwrap());
            let producer_queue = Arc::clone(&queue);
            let consumer_queue = Arc::clone(&queue);

            let producer = thread::spawn(move || {
                for i in 0..1000 {
                    while producer_queue.try_push(i) != State::Ok {
                        std::hint::spin_loop();
                    }
                }
            });

            let consumer: JoinHandle<()> = thread::spawn(move || {
                let mut count = 0;
                while count < 1000 {
                    if consumer_queue.pop().is_some() {
                        count += 1;
                    }
                }
            });

            producer.join().unwrap();
            consumer.join().unwrap();
        });
    });

    group.finish();
}

fn bench_blocking_queue(c: &mut Criterion) {
    let mut group: BenchmarkGroup<WallTime> = c.benchmark_group("blocking_queue");

    group.bench_function("push_pop_single_thread", |b| {
        let queue: BlockingQueue<i64> = BlockingQueue::new(1024).unwrap();

        b.iter(|| {
            queue.push(black_box(42));
            queue.pop();
        });
    });

    group.bench_function("spsc_threaded", |b| {
        b.iter(|| {
            let queue: Arc<BlockingQueue<i64>> = Arc::new(BlockingQueue::new(1024).unwrap());
            let producer_queue = Arc::clone(&queue);
            let consumer_queue = Arc::clone(&queue);

            let producer = thread::spawn(move || {
                for i in 0..1000 {
                    producer_queue.push(i);
                }
            });

            let consumer: JoinHandle<()> = thread::spawn(move || {
                let mut count = 0;
                while count < 1000 {
                    if consumer_queue.pop().is_some() {
                        count += 1;
                    }
                }
            });

            producer.join().unwrap();
            consumer.join().unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_lockfree_queue, bench_blocking_queue);
criterion_main!(benches);
