use crate::streamdriver::error::DriverError;
use crate::streamdriver::kafka::client::NativePartitionInfo;
use crate::streamdriver::kafka::translator::from_native_partition_info;
use crate::streamdriver::kafka::types::PartitionInfo;

/// Partition metadata queries, shared by consumer and producer drivers
///
/// Every call is a fresh broker round trip. Nothing is cached, so two calls
/// may disagree if leadership moved in between.
pub trait MetadataDriver: Send + Sync {
    /// Partitions of `topic` in broker order; empty when the broker does not
    /// know the topic
    fn partitions_for(&self, topic: &str) -> Result<Vec<PartitionInfo>, DriverError>;
}

pub(crate) fn translate_partitions(partitions: &[NativePartitionInfo]) -> Vec<PartitionInfo> {
    partitions.iter().map(from_native_partition_info).collect()
}
