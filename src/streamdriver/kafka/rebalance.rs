//! Rebalance listener adapter
//!
//! The broker client reports rebalances through two native callbacks carrying
//! a `TopicPartitionList`. Most callers only want one function receiving a
//! [`RebalanceEvent`]; [`make_listener`] turns such a function into the native
//! listener and passes a caller's own native listener through untouched.

use crate::streamdriver::kafka::translator::from_native_topic_partitions;
use crate::streamdriver::kafka::types::{RebalanceEvent, RebalanceKind};
use rdkafka::TopicPartitionList;
use std::fmt;
use std::sync::Arc;

/// Native partition-rebalance listener capability
///
/// `on_partitions_revoked` runs before the partitions are taken away,
/// `on_partitions_assigned` after the new assignment is in place. Both run on
/// the thread that is polling the consumer.
pub trait RebalanceListener: Send + Sync {
    fn on_partitions_assigned(&self, partitions: &TopicPartitionList);

    fn on_partitions_revoked(&self, partitions: &TopicPartitionList);
}

pub type RebalanceCallback = Arc<dyn Fn(RebalanceEvent) + Send + Sync>;

/// A listener as supplied by the caller, resolved once by [`make_listener`]
#[derive(Clone)]
pub enum Listener {
    /// Already a native listener, used as-is
    Native(Arc<dyn RebalanceListener>),
    /// Plain function receiving canonical events
    Callback(RebalanceCallback),
}

impl Listener {
    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(RebalanceEvent) + Send + Sync + 'static,
    {
        Listener::Callback(Arc::new(callback))
    }

    pub fn native<L>(listener: L) -> Self
    where
        L: RebalanceListener + 'static,
    {
        Listener::Native(Arc::new(listener))
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listener::Native(_) => f.write_str("Listener::Native"),
            Listener::Callback(_) => f.write_str("Listener::Callback"),
        }
    }
}

impl<F> From<F> for Listener
where
    F: Fn(RebalanceEvent) + Send + Sync + 'static,
{
    fn from(callback: F) -> Self {
        Listener::callback(callback)
    }
}

/// Stateless wrapper turning a callback into a native listener
struct CallbackListener {
    callback: RebalanceCallback,
}

impl CallbackListener {
    fn dispatch(&self, event: RebalanceKind, partitions: &TopicPartitionList) {
        let partitions = from_native_topic_partitions(partitions);
        log::debug!(
            target: "rebalance",
            "Partitions {}: {}",
            event,
            partitions.len()
        );
        (self.callback)(RebalanceEvent { event, partitions });
    }
}

impl RebalanceListener for CallbackListener {
    fn on_partitions_assigned(&self, partitions: &TopicPartitionList) {
        self.dispatch(RebalanceKind::Assigned, partitions);
    }

    fn on_partitions_revoked(&self, partitions: &TopicPartitionList) {
        self.dispatch(RebalanceKind::Revoked, partitions);
    }
}

/// Resolve a caller-supplied listener into the native capability
pub fn make_listener(listener: Listener) -> Arc<dyn RebalanceListener> {
    match listener {
        Listener::Native(native) => native,
        Listener::Callback(callback) => Arc::new(CallbackListener { callback }),
    }
}
