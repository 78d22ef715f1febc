// Workload event: one fact about a training session's effect on a trainer's workload.
//
// Purpose
// - Carry a single signed duration delta for one trainer and one calendar month.
//
// Responsibilities
// - Define the wire payload exchanged between the CRM producer and this service.
// - Validate the payload explicitly. Nothing reaches the aggregator unvalidated.
//
// Invariants
// - duration_minutes is always positive. The sign of the delta comes from the action.
// - The action is a closed set. Unknown values are rejected, never defaulted.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionType {
    Add,
    Delete,
}

impl ActionType {
    pub fn signed(self, duration_minutes: u32) -> i64 {
        match self {
            ActionType::Add => i64::from(duration_minutes),
            ActionType::Delete => -i64::from(duration_minutes),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("malformed workload payload: {0}")]
    Malformed(String),

    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{field} must not be blank")]
    BlankField { field: &'static str },

    #[error("trainingDuration must be positive, got {value}")]
    NonPositiveDuration { value: i64 },

    #[error("trainingDuration {value} is out of range")]
    DurationOutOfRange { value: i64 },
}

impl ValidationError {
    /// Wire name of the offending field, when the error is about one field.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::Malformed(_) => None,
            ValidationError::MissingField { field } | ValidationError::BlankField { field } => {
                Some(*field)
            }
            ValidationError::NonPositiveDuration { .. }
            | ValidationError::DurationOutOfRange { .. } => Some("trainingDuration"),
        }
    }
}

/// Transport shape of a workload event. Required fields are optional here so that
/// validation can name the one that is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadEventPayload {
    pub trainer_username: Option<String>,
    pub trainer_first_name: Option<String>,
    pub trainer_last_name: Option<String>,
    #[serde(default)]
    pub active: bool,
    pub training_date: Option<NaiveDate>,
    pub training_duration: Option<i64>,
    pub action_type: Option<ActionType>,
}

impl WorkloadEventPayload {
    pub fn into_event(self) -> Result<WorkloadEvent, ValidationError> {
        let trainer_username = required_text("trainerUsername", self.trainer_username)?;
        let trainer_first_name = required_text("trainerFirstName", self.trainer_first_name)?;
        let trainer_last_name = required_text("trainerLastName", self.trainer_last_name)?;
        let session_date = self.training_date.ok_or(ValidationError::MissingField {
            field: "trainingDate",
        })?;
        let duration = self.training_duration.ok_or(ValidationError::MissingField {
            field: "trainingDuration",
        })?;
        if duration <= 0 {
            return Err(ValidationError::NonPositiveDuration { value: duration });
        }
        let duration_minutes = u32::try_from(duration)
            .map_err(|_| ValidationError::DurationOutOfRange { value: duration })?;
        let action = self.action_type.ok_or(ValidationError::MissingField {
            field: "actionType",
        })?;

        Ok(WorkloadEvent {
            trainer_username,
            trainer_first_name,
            trainer_last_name,
            trainer_active: self.active,
            session_date,
            duration_minutes,
            action,
        })
    }
}

fn required_text(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    let value = value.ok_or(ValidationError::MissingField { field })?;
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField { field });
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadEvent {
    pub trainer_username: String,
    pub trainer_first_name: String,
    pub trainer_last_name: String,
    pub trainer_active: bool,
    pub session_date: NaiveDate,
    pub duration_minutes: u32,
    pub action: ActionType,
}

impl WorkloadEvent {
    /// Decodes and validates a raw channel payload.
    pub fn from_slice(raw: &[u8]) -> Result<Self, ValidationError> {
        let payload: WorkloadEventPayload = serde_json::from_slice(raw)
            .map_err(|error| ValidationError::Malformed(error.to_string()))?;
        payload.into_event()
    }

    /// Re-checks the invariants of an event built in code rather than decoded.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("trainerUsername", &self.trainer_username),
            ("trainerFirstName", &self.trainer_first_name),
            ("trainerLastName", &self.trainer_last_name),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::BlankField { field });
            }
        }
        if self.duration_minutes == 0 {
            return Err(ValidationError::NonPositiveDuration { value: 0 });
        }
        Ok(())
    }

    pub fn to_payload(&self) -> WorkloadEventPayload {
        WorkloadEventPayload {
            trainer_username: Some(self.trainer_username.clone()),
            trainer_first_name: Some(self.trainer_first_name.clone()),
            trainer_last_name: Some(self.trainer_last_name.clone()),
            active: self.trainer_active,
            training_date: Some(self.session_date),
            training_duration: Some(i64::from(self.duration_minutes)),
            action_type: Some(self.action),
        }
    }

    pub fn year(&self) -> i32 {
        self.session_date.year()
    }

    pub fn month(&self) -> u32 {
        self.session_date.month()
    }

    pub fn delta_minutes(&self) -> i64 {
        self.action.signed(self.duration_minutes)
    }
}
