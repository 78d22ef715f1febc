use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::modules::workload::core::ports::SummaryStore;
use crate::modules::workload::use_cases::apply_workload::consumer::{
    WorkloadConsumer, run_partition_worker,
};
use crate::shared::infrastructure::message_channel::in_memory::PartitionReceiver;

/// One consumer task per partition, so each trainer has a single writer.
pub fn spawn_partition_workers<TStore>(
    consumer: Arc<WorkloadConsumer<TStore>>,
    receivers: Vec<PartitionReceiver>,
) -> Vec<JoinHandle<()>>
where
    TStore: SummaryStore + 'static,
{
    receivers
        .into_iter()
        .map(|receiver| tokio::spawn(run_partition_worker(consumer.clone(), receiver)))
        .collect()
}
