//! Manager layer: the key→queue/producer/consumer registries (C6) and
//! the MPSC subscription/worker-thread lifecycle built on top of them
//! (C7).

mod base;
mod mpsc;

pub use base::BaseManager;
pub use mpsc::MpscManager;

use std::collections::BTreeMap;

use crate::consumer::ConsumerHandle;
use crate::producer::ProducerHandle;
use crate::queue::QueueHandle;

/// Registries shared by [`BaseManager`] and [`MpscManager`].
///
/// A `BTreeMap` gives an ordered, range-traversable key space (the same
/// role `boost::container::flat_map` plays in the source this is ported
/// from). `producers` is a multimap —
/// many producers may write to the same queue — represented as a map of
/// `Vec`s, which is the natural Rust shape for "many values per key" when
/// the set of keys is small relative to churn.
pub(crate) struct Registries<K, V> {
    pub(crate) queues: BTreeMap<K, QueueHandle<V>>,
    pub(crate) producers: BTreeMap<K, Vec<ProducerHandle<K, V>>>,
    pub(crate) consumers: BTreeMap<K, ConsumerHandle<V>>,
}

impl<K: Ord, V> Default for Registries<K, V> {
    fn default() -> Self {
        Self {
            queues: BTreeMap::new(),
            producers: BTreeMap::new(),
            consumers: BTreeMap::new(),
        }
    }
}
