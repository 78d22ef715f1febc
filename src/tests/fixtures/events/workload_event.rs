// Shared test fixture for WorkloadEvent.
// Compiled into the crate only during tests via the `tests` module in src/lib.rs.

use crate::modules::workload::core::event::{ActionType, WorkloadEvent};
use chrono::NaiveDate;

/// Canonical wire payload matching `WorkloadEventBuilder::new().build()`.
pub fn payload_json() -> serde_json::Value {
    serde_json::json!({
        "trainerUsername": "jane.doe",
        "trainerFirstName": "Jane",
        "trainerLastName": "Doe",
        "active": true,
        "trainingDate": "2025-03-10",
        "trainingDuration": 60,
        "actionType": "ADD"
    })
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("fixture date should be valid")
}

pub struct WorkloadEventBuilder {
    inner: WorkloadEvent,
}

impl Default for WorkloadEventBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl WorkloadEventBuilder {
    pub fn new() -> Self {
        Self {
            inner: WorkloadEvent {
                trainer_username: "jane.doe".to_string(),
                trainer_first_name: "Jane".to_string(),
                trainer_last_name: "Doe".to_string(),
                trainer_active: true,
                session_date: date(2025, 3, 10),
                duration_minutes: 60,
                action: ActionType::Add,
            },
        }
    }

    pub fn trainer_username(mut self, v: impl Into<String>) -> Self {
        self.inner.trainer_username = v.into();
        self
    }

    pub fn trainer_first_name(mut self, v: impl Into<String>) -> Self {
        self.inner.trainer_first_name = v.into();
        self
    }

    pub fn trainer_last_name(mut self, v: impl Into<String>) -> Self {
        self.inner.trainer_last_name = v.into();
        self
    }

    pub fn trainer_active(mut self, v: bool) -> Self {
        self.inner.trainer_active = v;
        self
    }

    pub fn session_date(mut self, year: i32, month: u32, day: u32) -> Self {
        self.inner.session_date = date(year, month, day);
        self
    }

    pub fn duration_minutes(mut self, v: u32) -> Self {
        self.inner.duration_minutes = v;
        self
    }

    pub fn action(mut self, v: ActionType) -> Self {
        self.inner.action = v;
        self
    }

    pub fn add(self, minutes: u32) -> Self {
        self.action(ActionType::Add).duration_minutes(minutes)
    }

    pub fn delete(self, minutes: u32) -> Self {
        self.action(ActionType::Delete).duration_minutes(minutes)
    }

    pub fn build(self) -> WorkloadEvent {
        self.inner
    }
}
