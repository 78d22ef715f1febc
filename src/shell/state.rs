use crate::modules::workload::adapters::outbound::channel_publisher::ChannelEventPublisher;
use crate::modules::workload::adapters::outbound::summary_store_in_memory::InMemorySummaryStore;
use crate::modules::workload::use_cases::apply_workload::aggregator::WorkloadAggregator;
use crate::modules::workload::use_cases::apply_workload::consumer::WorkloadConsumer;
use crate::modules::workload::use_cases::get_trainer_summary::handler::SummaryQueryService;
use crate::modules::workload::use_cases::publish_workload::guarded::GuardedEventPublisher;
use crate::modules::workload::use_cases::publish_workload::handler::PublishWorkloadHandler;
use crate::shared::infrastructure::message_channel::in_memory::{
    InMemoryMessageChannel, PartitionReceiver,
};
use crate::shell::config::AppConfig;
use std::sync::Arc;

pub type WorkloadPublisher = ChannelEventPublisher<InMemoryMessageChannel>;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<InMemorySummaryStore>,
    pub channel: Arc<InMemoryMessageChannel>,
    pub aggregator: Arc<WorkloadAggregator<InMemorySummaryStore>>,
    pub consumer: Arc<WorkloadConsumer<InMemorySummaryStore>>,
    pub summaries: Arc<SummaryQueryService<InMemorySummaryStore>>,
    pub publish_handler: Arc<PublishWorkloadHandler<WorkloadPublisher>>,
}

impl AppState {
    /// Wires the in-memory adapters into every use case. The receivers are returned
    /// separately so the caller decides where the partition workers run.
    pub fn in_memory(config: &AppConfig) -> (Self, Vec<PartitionReceiver>) {
        let store = Arc::new(InMemorySummaryStore::new());
        let (channel, receivers) = InMemoryMessageChannel::new(
            config.partitions,
            config.channel_capacity,
            config.redelivery,
        );
        let channel = Arc::new(channel);

        let aggregator = Arc::new(
            WorkloadAggregator::new(store.clone())
                .with_max_conflict_retries(config.max_conflict_retries),
        );
        let publisher = Arc::new(ChannelEventPublisher::new(channel.clone()));
        let publish_handler = Arc::new(PublishWorkloadHandler::new(GuardedEventPublisher::new(
            publisher,
            config.breaker,
        )));

        let state = Self {
            consumer: Arc::new(WorkloadConsumer::new(aggregator.clone())),
            summaries: Arc::new(SummaryQueryService::new(store.clone())),
            store,
            channel,
            aggregator,
            publish_handler,
        };
        (state, receivers)
    }
}
