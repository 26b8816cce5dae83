//! MPSC manager (C7): subscribe/unsubscribe plus the consumer worker
//! thread lifecycle built on top of [`BaseManager`].

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};

use log::{debug, trace};
use parking_lot::Mutex;

use crate::config::BrokerConfig;
use crate::consumer::ConsumerHandle;
use crate::error::Result;
use crate::producer::ProducerHandle;
use crate::queue::{QueueHandle, State};

use super::BaseManager;

/// Binds exactly one consumer worker thread per subscribed key and drives
/// it against that key's queue until the queue is disabled and drained.
///
/// Composition, not inheritance: `MpscManager` holds a `BaseManager` and
/// delegates the registry operations it doesn't need to specialise.
pub struct MpscManager<K, V> {
    core: BaseManager<K, V>,
    consumer_threads: Mutex<BTreeMap<K, JoinHandle<()>>>,
}

impl<K, V> MpscManager<K, V>
where
    K: Ord + Clone + Debug + Send + Sync + 'static,
    V: Send + 'static,
{
    pub fn new() -> Self {
        Self::with_config(BrokerConfig::default()).expect("default BrokerConfig is always valid")
    }

    /// Create a manager using the given configuration.
    ///
    /// # Errors
    /// Returns [`crate::error::Error::Config`] if `config` fails
    /// [`crate::config::BrokerConfig::validate`].
    pub fn with_config(config: BrokerConfig) -> Result<Self> {
        Ok(Self {
            core: BaseManager::with_config(config)?,
            consumer_threads: Mutex::new(BTreeMap::new()),
        })
    }

    // --- delegated registry operations ---

    pub fn is_enabled(&self) -> bool {
        self.core.is_enabled()
    }

    pub fn metrics(&self) -> crate::metrics::MetricsSummary {
        self.core.metrics()
    }

    pub fn add_queue(&self, key: K, queue: QueueHandle<V>) -> State {
        self.core.add_queue(key, queue)
    }

    pub fn get_queue(&self, key: &K) -> (Option<QueueHandle<V>>, State) {
        self.core.get_queue(key)
    }

    pub fn enqueue(&self, key: &K, value: V) -> State {
        self.core.enqueue(key, value)
    }

    pub fn register_producer(&self, key: &K, producer: ProducerHandle<K, V>) -> State {
        self.core.register_producer(key, producer)
    }

    pub fn unregister_producer(&self, key: &K, producer: &ProducerHandle<K, V>) -> State {
        self.core.unregister_producer(key, producer)
    }

    pub fn are_all_queues_empty(&self) -> bool {
        self.core.are_all_queues_empty()
    }

    pub fn are_all_producers_done(&self) -> bool {
        self.core.are_all_producers_done()
    }

    // --- MPSC-specific operations ---

    /// Bind `consumer` to the queue at `key` and spawn its worker thread.
    ///
    /// Fails with `QueueAbsent` if no queue is bound to `key`, or
    /// `QueueBusy` if a consumer is already subscribed there —
    /// subscription is exclusive, unlike producer registration.
    pub fn subscribe(&self, key: K, consumer: ConsumerHandle<V>) -> State {
        let (queue, state) = self.core.get_queue(&key);
        let queue = match queue {
            Some(q) => q,
            None => return state,
        };

        {
            let mut reg = self.core.registries.lock();
            if reg.consumers.contains_key(&key) {
                return State::QueueBusy;
            }
            reg.consumers.insert(key.clone(), consumer.clone());
        }

        self.core.metrics.lock().record_consumer_subscribed();
        self.spawn_worker(key, queue, consumer);
        State::Ok
    }

    /// Detach the consumer bound to `key`, stopping and joining its worker.
    /// Does not disable the queue itself, so buffered producers may still
    /// enqueue into it until the queue is separately removed or stopped.
    pub fn unsubscribe(&self, key: &K) -> State {
        let consumer = {
            let mut reg = self.core.registries.lock();
            match reg.consumers.remove(key) {
                Some(c) => c,
                None => return State::QueueAbsent,
            }
        };
        consumer.set_enabled(false);

        if let Some(handle) = self.consumer_threads.lock().remove(key) {
            let _ = handle.join();
        }

        self.core.metrics.lock().record_consumer_unsubscribed();
        debug!("unsubscribe({key:?}) -> Ok");
        State::Ok
    }

    /// Disable and remove the queue at `key`: unsubscribes first so the
    /// worker thread is joined before the queue's registry entry is torn
    /// down, then delegates to [`BaseManager::remove_queue`].
    pub fn remove_queue(&self, key: &K) -> State {
        self.unsubscribe(key);
        self.core.remove_queue(key)
    }

    /// Re-enable the manager and every queue, then respawn a worker for
    /// every still-registered consumer.
    pub fn start_processing(&self) {
        self.core.start_processing();

        let consumers: Vec<(K, ConsumerHandle<V>)> = {
            let reg = self.core.registries.lock();
            reg.consumers
                .iter()
                .map(|(k, c)| (k.clone(), c.clone()))
                .collect()
        };

        for (key, consumer) in consumers {
            let (queue, state) = self.core.get_queue(&key);
            if let Some(queue) = queue {
                consumer.set_enabled(true);
                self.spawn_worker(key, queue, consumer);
            } else {
                debug_assert_eq!(state, State::QueueAbsent);
            }
        }
    }

    /// Stop every queue and producer, then join every consumer worker
    /// thread. Consumers remain registered (only disabled) so
    /// `start_processing` can respawn them.
    pub fn stop_processing(&self) {
        self.core.stop_processing();

        let handles: Vec<JoinHandle<()>> =
            std::mem::take(&mut *self.consumer_threads.lock())
                .into_values()
                .collect();
        for handle in handles {
            let _ = handle.join();
        }
    }

    fn spawn_worker(&self, key: K, queue: QueueHandle<V>, consumer: ConsumerHandle<V>) {
        let poll_interval = self.core.config.lockfree_poll_interval;
        let metrics = self.core.metrics.clone();
        let is_enabled = self.core.is_enabled.clone();
        let log_key = key.clone();

        let handle = thread::Builder::new()
            .name(format!("mpsc-consumer-{log_key:?}"))
            .spawn(move || {
                trace!("consumer worker for {log_key:?} started");
                loop {
                    match queue.pop() {
                        Some(value) => {
                            consumer.consume(value);
                            metrics.lock().record_consumed();
                        }
                        None => {
                            if !consumer.enabled()
                                || !queue.enabled()
                                || !is_enabled.load(Ordering::Acquire)
                            {
                                break;
                            }
                            // Lock-free queues never block in `pop`; poll
                            // instead of busy-spinning.
                            thread::sleep(poll_interval);
                        }
                    }
                }
                trace!("consumer worker for {log_key:?} exiting");
            })
            .expect("failed to spawn consumer worker thread");

        self.consumer_threads.lock().insert(key, handle);
    }
}

impl<K, V> Default for MpscManager<K, V>
where
    K: Ord + Clone + Debug + Send + Sync + 'static,
    V: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for MpscManager<K, V>
where
    K: Ord + Clone + Debug + Send + Sync + 'static,
    V: Send + 'static,
{
    fn drop(&mut self) {
        self.stop_processing();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use crate::consumer::{Consumer, ConsumerFlag};
    use crate::queue::BlockingQueue;

    use super::*;

    struct Collector {
        values: StdMutex<Vec<i32>>,
        flag: ConsumerFlag,
    }

    impl Collector {
        fn new() -> Self {
            Self {
                values: StdMutex::new(Vec::new()),
                flag: ConsumerFlag::new(),
            }
        }

        fn snapshot(&self) -> Vec<i32> {
            self.values.lock().unwrap().clone()
        }
    }

    impl Consumer<i32> for Collector {
        fn consume(&self, value: i32) {
            self.values.lock().unwrap().push(value);
        }
        fn enabled(&self) -> bool {
            self.flag.enabled()
        }
        fn set_enabled(&self, enabled: bool) {
            self.flag.set_enabled(enabled);
        }
    }

    fn wait_for(mut check: impl FnMut() -> bool) {
        for _ in 0..200 {
            if check() {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(check(), "condition never became true");
    }

    #[test]
    fn subscribe_delivers_enqueued_values() {
        let mgr: MpscManager<&'static str, i32> = MpscManager::new();
        let queue: QueueHandle<i32> = Arc::new(BlockingQueue::new(8).unwrap());
        assert_eq!(mgr.add_queue("a", queue), State::Ok);

        let collector = Arc::new(Collector::new());
        assert_eq!(mgr.subscribe("a", collector.clone()), State::Ok);

        for v in 0..5 {
            assert_eq!(mgr.enqueue(&"a", v), State::Ok);
        }

        wait_for(|| collector.snapshot().len() == 5);
        assert_eq!(collector.snapshot(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn double_subscribe_returns_busy() {
        let mgr: MpscManager<&'static str, i32> = MpscManager::new();
        let queue: QueueHandle<i32> = Arc::new(BlockingQueue::new(8).unwrap());
        mgr.add_queue("a", queue);

        let first = Arc::new(Collector::new());
        let second = Arc::new(Collector::new());
        assert_eq!(mgr.subscribe("a", first), State::Ok);
        assert_eq!(mgr.subscribe("a", second), State::QueueBusy);
    }

    #[test]
    fn unsubscribe_then_resubscribe_continues_delivery() {
        let mgr: MpscManager<&'static str, i32> = MpscManager::new();
        let queue: QueueHandle<i32> = Arc::new(BlockingQueue::new(8).unwrap());
        mgr.add_queue("a", queue);

        let first = Arc::new(Collector::new());
        mgr.subscribe("a", first.clone());
        mgr.enqueue(&"a", 1);
        wait_for(|| first.snapshot().len() == 1);

        assert_eq!(mgr.unsubscribe(&"a"), State::Ok);

        let second = Arc::new(Collector::new());
        assert_eq!(mgr.subscribe("a", second.clone()), State::Ok);
        mgr.enqueue(&"a", 2);
        wait_for(|| second.snapshot().len() == 1);
        assert_eq!(second.snapshot(), vec![2]);
    }

    #[test]
    fn stop_then_start_processing_respawns_worker() {
        let mgr: MpscManager<&'static str, i32> = MpscManager::new();
        let queue: QueueHandle<i32> = Arc::new(BlockingQueue::new(8).unwrap());
        mgr.add_queue("a", queue.clone());

        let collector = Arc::new(Collector::new());
        mgr.subscribe("a", collector.clone());
        mgr.enqueue(&"a", 1);
        wait_for(|| collector.snapshot().len() == 1);

        mgr.stop_processing();
        assert!(!mgr.is_enabled());

        mgr.start_processing();
        assert!(mgr.is_enabled());

        let queue2: QueueHandle<i32> = Arc::new(BlockingQueue::new(8).unwrap());
        mgr.add_queue("b", queue2);
        let collector_b = Arc::new(Collector::new());
        mgr.subscribe("b", collector_b.clone());
        mgr.enqueue(&"b", 2);
        wait_for(|| collector_b.snapshot().len() == 1);
    }
}
