use crate::modules::workload::adapters::outbound::summary_store_in_memory::InMemorySummaryStore;
use crate::modules::workload::core::event::WorkloadEventPayload;
use crate::modules::workload::core::ports::SummaryStore;
use crate::modules::workload::use_cases::publish_workload::guarded::PublishOutcome;
use crate::shared::core::correlation::CorrelationId;
use crate::shared::core::requester::AuthenticatedUser;
use crate::shared::infrastructure::message_channel::in_memory::InMemoryMessageChannel;
use crate::shared::infrastructure::message_channel::redelivery::RedeliveryPolicy;
use crate::shared::infrastructure::message_channel::{DeadLetter, Envelope, MessageChannel};
use crate::shell::config::AppConfig;
use crate::shell::state::AppState;
use crate::shell::workers::spawn_partition_workers;
use crate::tests::fixtures::events::workload_event::WorkloadEventBuilder;
use std::time::Duration;
use tokio::time::{Instant, sleep};

const DEADLINE: Duration = Duration::from_secs(5);

fn config(max_attempts: u32) -> AppConfig {
    AppConfig {
        partitions: 2,
        channel_capacity: 64,
        redelivery: RedeliveryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(40),
            backoff_multiplier: 2.0,
        },
        ..AppConfig::default()
    }
}

fn running_pipeline(config: &AppConfig) -> AppState {
    let (state, receivers) = AppState::in_memory(config);
    spawn_partition_workers(state.consumer.clone(), receivers);
    state
}

async fn publish(state: &AppState, builder: WorkloadEventBuilder) {
    let payload: WorkloadEventPayload = builder.build().to_payload();
    let outcome = state
        .publish_handler
        .handle(payload, &CorrelationId::generate())
        .await
        .expect("payload rejected");
    assert_eq!(outcome, PublishOutcome::Published);
}

async fn wait_for_total(
    store: &InMemorySummaryStore,
    username: &str,
    (year, month): (i32, u32),
    expected: i64,
) {
    let deadline = Instant::now() + DEADLINE;
    loop {
        let total = store
            .get(username)
            .await
            .ok()
            .flatten()
            .and_then(|stored| stored.summary.month_total(year, month));
        if total == Some(expected) {
            return;
        }
        assert!(
            Instant::now() < deadline,
            "{username} {year}-{month} stuck at {total:?}, expected {expected}"
        );
        sleep(Duration::from_millis(10)).await;
    }
}

async fn wait_for_dead_letters(channel: &InMemoryMessageChannel, expected: usize) -> Vec<DeadLetter> {
    let deadline = Instant::now() + DEADLINE;
    loop {
        let dead_letters = channel.dead_letters().await;
        if dead_letters.len() >= expected {
            return dead_letters;
        }
        assert!(
            Instant::now() < deadline,
            "expected {expected} dead letters, got {}",
            dead_letters.len()
        );
        sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn published_workload_reaches_the_trainers_own_summary() {
    let state = running_pipeline(&config(5));

    publish(&state, WorkloadEventBuilder::new().add(60)).await;
    publish(&state, WorkloadEventBuilder::new().add(30)).await;
    publish(&state, WorkloadEventBuilder::new().delete(60)).await;
    publish(
        &state,
        WorkloadEventBuilder::new()
            .trainer_username("john.roe")
            .trainer_first_name("John")
            .trainer_last_name("Roe")
            .session_date(2025, 4, 1)
            .add(45),
    )
    .await;

    wait_for_total(&state.store, "jane.doe", (2025, 3), 30).await;
    wait_for_total(&state.store, "john.roe", (2025, 4), 45).await;

    let jane = state
        .summaries
        .get_summary("jane.doe", &AuthenticatedUser("jane.doe".into()))
        .await
        .expect("query failed");
    assert_eq!(jane.trainer_first_name, "Jane");
    assert_eq!(jane.month_total(2025, 4), None);
    assert!(state.channel.dead_letters().await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn events_of_one_trainer_are_applied_in_publish_order() {
    let state = running_pipeline(&config(5));

    for minutes in 1..=20 {
        publish(
            &state,
            WorkloadEventBuilder::new()
                .trainer_last_name(format!("Doe-{minutes}"))
                .trainer_active(minutes % 2 == 1)
                .add(minutes),
        )
        .await;
        publish(
            &state,
            WorkloadEventBuilder::new()
                .trainer_username("john.roe")
                .add(minutes),
        )
        .await;
    }

    wait_for_total(&state.store, "jane.doe", (2025, 3), 210).await;
    wait_for_total(&state.store, "john.roe", (2025, 3), 210).await;

    // descriptive fields are last-write-wins, so only the final event may show
    let jane = state.store.get("jane.doe").await.unwrap().unwrap().summary;
    assert_eq!(jane.trainer_last_name, "Doe-20");
    assert!(!jane.trainer_active);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_store_outage_is_ridden_out_by_redelivery() {
    let state = running_pipeline(&config(20));
    state.store.toggle_offline();

    publish(&state, WorkloadEventBuilder::new().add(60)).await;
    sleep(Duration::from_millis(60)).await;
    state.store.toggle_offline();

    wait_for_total(&state.store, "jane.doe", (2025, 3), 60).await;
    assert!(state.channel.dead_letters().await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_message_is_dead_lettered_once_redelivery_is_exhausted() {
    let state = running_pipeline(&config(3));
    state.store.toggle_offline();

    publish(&state, WorkloadEventBuilder::new().add(60)).await;

    let dead_letters = wait_for_dead_letters(&state.channel, 1).await;
    assert_eq!(dead_letters[0].attempts, 3);
    assert!(dead_letters[0].reason.starts_with("retries exhausted"));

    state.store.toggle_offline();
    assert!(state.store.is_empty().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_malformed_message_is_dead_lettered_and_the_partition_keeps_flowing() {
    let state = running_pipeline(&config(5));

    state
        .channel
        .send(Envelope::new("jane.doe", br#"{"trainerUsername":"jane.doe"}"#.to_vec()))
        .await
        .expect("send failed");
    publish(&state, WorkloadEventBuilder::new().add(60)).await;

    let dead_letters = wait_for_dead_letters(&state.channel, 1).await;
    assert_eq!(dead_letters.len(), 1);
    assert_eq!(dead_letters[0].attempts, 1);
    assert_eq!(dead_letters[0].envelope.key, "jane.doe");

    wait_for_total(&state.store, "jane.doe", (2025, 3), 60).await;
}
