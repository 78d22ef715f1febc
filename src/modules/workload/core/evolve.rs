use crate::modules::workload::core::event::WorkloadEvent;
use crate::modules::workload::core::summary::TrainerSummary;

/// Applies one workload event to a trainer summary.
///
/// Descriptive fields are last-write-wins. The month total moves by the signed
/// duration, so the order in which events of one month arrive never changes the
/// final total.
pub fn evolve(mut summary: TrainerSummary, event: &WorkloadEvent) -> TrainerSummary {
    summary.trainer_first_name = event.trainer_first_name.clone();
    summary.trainer_last_name = event.trainer_last_name.clone();
    summary.trainer_active = event.trainer_active;

    let month = summary.month_mut(event.year(), event.month());
    month.total_duration_minutes = month
        .total_duration_minutes
        .saturating_add(event.delta_minutes());
    summary
}

#[cfg(test)]
mod workload_evolve_tests {
    use super::*;
    use crate::tests::fixtures::events::workload_event::WorkloadEventBuilder;
    use rstest::rstest;

    fn fold(events: &[WorkloadEvent]) -> TrainerSummary {
        events
            .iter()
            .fold(TrainerSummary::empty("jane.doe"), evolve)
    }

    #[rstest]
    fn it_should_add_the_duration_to_the_month() {
        let summary = fold(&[WorkloadEventBuilder::new().add(60).build()]);
        assert_eq!(summary.month_total(2025, 3), Some(60));
        assert_eq!(summary.trainer_first_name, "Jane");
        assert_eq!(summary.trainer_last_name, "Doe");
        assert!(summary.trainer_active);
    }

    #[rstest]
    fn it_should_return_to_zero_when_an_add_is_deleted() {
        let summary = fold(&[
            WorkloadEventBuilder::new().add(60).build(),
            WorkloadEventBuilder::new().delete(60).build(),
        ]);
        assert_eq!(summary.month_total(2025, 3), Some(0));
    }

    #[rstest]
    fn it_should_net_adds_and_deletes_within_a_month() {
        let april = |builder: WorkloadEventBuilder| builder.session_date(2025, 4, 2).build();
        let summary = fold(&[
            april(WorkloadEventBuilder::new().add(30)),
            april(WorkloadEventBuilder::new().add(45)),
        ]);
        assert_eq!(summary.month_total(2025, 4), Some(75));

        let summary = evolve(summary, &april(WorkloadEventBuilder::new().delete(10)));
        assert_eq!(summary.month_total(2025, 4), Some(65));
    }

    #[rstest]
    #[case::in_order([0, 1, 2])]
    #[case::reversed([2, 1, 0])]
    #[case::interleaved([1, 2, 0])]
    fn it_should_sum_adds_regardless_of_order(#[case] order: [usize; 3]) {
        let adds = [
            WorkloadEventBuilder::new().add(20).build(),
            WorkloadEventBuilder::new().add(35).session_date(2025, 3, 28).build(),
            WorkloadEventBuilder::new().add(50).session_date(2025, 3, 1).build(),
        ];
        let events: Vec<_> = order.iter().map(|index| adds[*index].clone()).collect();
        assert_eq!(fold(&events).month_total(2025, 3), Some(105));
    }

    #[rstest]
    fn it_should_restore_the_prior_total_after_matching_deletes() {
        let base = fold(&[WorkloadEventBuilder::new().add(90).build()]);
        let summary = [15, 40, 25].into_iter().fold(base.clone(), |summary, minutes| {
            let summary = evolve(summary, &WorkloadEventBuilder::new().add(minutes).build());
            evolve(summary, &WorkloadEventBuilder::new().delete(minutes).build())
        });
        assert_eq!(summary.month_total(2025, 3), base.month_total(2025, 3));
    }

    #[rstest]
    fn it_should_tolerate_a_delete_arriving_before_its_add() {
        let summary = fold(&[WorkloadEventBuilder::new().delete(60).build()]);
        assert_eq!(summary.month_total(2025, 3), Some(-60));

        let summary = evolve(summary, &WorkloadEventBuilder::new().add(60).build());
        assert_eq!(summary.month_total(2025, 3), Some(0));
    }

    #[rstest]
    fn it_should_keep_months_and_years_apart() {
        let summary = fold(&[
            WorkloadEventBuilder::new().add(60).build(),
            WorkloadEventBuilder::new().add(30).session_date(2025, 4, 1).build(),
            WorkloadEventBuilder::new().add(15).session_date(2024, 3, 10).build(),
        ]);
        assert_eq!(summary.month_total(2025, 3), Some(60));
        assert_eq!(summary.month_total(2025, 4), Some(30));
        assert_eq!(summary.month_total(2024, 3), Some(15));
        assert_eq!(summary.years.len(), 2);
    }

    #[rstest]
    fn it_should_overwrite_descriptive_fields_with_the_latest_event() {
        let summary = fold(&[
            WorkloadEventBuilder::new().build(),
            WorkloadEventBuilder::new()
                .trainer_last_name("Smith")
                .trainer_active(false)
                .build(),
        ]);
        assert_eq!(summary.trainer_last_name, "Smith");
        assert!(!summary.trainer_active);
        assert_eq!(summary.month_total(2025, 3), Some(120));
    }
}
