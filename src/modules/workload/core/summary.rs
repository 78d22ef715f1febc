// Trainer summary: the accumulated workload of one trainer, per year and month.
//
// Lifecycle
// - Created lazily on the first event seen for a username, never deleted.
// - Replaced as a whole on every write.
//
// A month total may be negative for a while when a delete overtakes its matching add.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainerSummary {
    pub trainer_username: String,
    pub trainer_first_name: String,
    pub trainer_last_name: String,
    pub trainer_active: bool,
    pub years: BTreeMap<i32, YearSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSummary {
    pub months: BTreeMap<u32, MonthSummary>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    pub total_duration_minutes: i64,
}

impl TrainerSummary {
    pub fn empty(trainer_username: impl Into<String>) -> Self {
        Self {
            trainer_username: trainer_username.into(),
            trainer_first_name: String::new(),
            trainer_last_name: String::new(),
            trainer_active: false,
            years: BTreeMap::new(),
        }
    }

    pub fn month_total(&self, year: i32, month: u32) -> Option<i64> {
        self.years
            .get(&year)
            .and_then(|year_summary| year_summary.months.get(&month))
            .map(|month_summary| month_summary.total_duration_minutes)
    }

    /// The month's summary, created empty when it does not exist yet.
    pub fn month_mut(&mut self, year: i32, month: u32) -> &mut MonthSummary {
        self.years
            .entry(year)
            .or_default()
            .months
            .entry(month)
            .or_default()
    }
}
