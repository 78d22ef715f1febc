use async_graphql::{Context, ErrorExtensions, Object, Result as GqlResult, SimpleObject};

use crate::modules::workload::core::summary::{MonthSummary, TrainerSummary, YearSummary};
use crate::modules::workload::use_cases::get_trainer_summary::handler::QueryError;
use crate::shared::core::requester::AuthenticatedUser;
use crate::shell::state::AppState;

#[derive(SimpleObject, Clone)]
pub struct GqlMonthSummary {
    pub month: u32,
    pub total_duration_minutes: i64,
}

#[derive(SimpleObject, Clone)]
pub struct GqlYearSummary {
    pub year: i32,
    pub months: Vec<GqlMonthSummary>,
}

#[derive(SimpleObject, Clone)]
pub struct GqlTrainerSummary {
    pub trainer_username: String,
    pub trainer_first_name: String,
    pub trainer_last_name: String,
    pub trainer_active: bool,
    pub years: Vec<GqlYearSummary>,
}

impl From<(u32, MonthSummary)> for GqlMonthSummary {
    fn from((month, summary): (u32, MonthSummary)) -> Self {
        Self {
            month,
            total_duration_minutes: summary.total_duration_minutes,
        }
    }
}

impl From<(i32, YearSummary)> for GqlYearSummary {
    fn from((year, summary): (i32, YearSummary)) -> Self {
        Self {
            year,
            months: summary.months.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<TrainerSummary> for GqlTrainerSummary {
    fn from(v: TrainerSummary) -> Self {
        Self {
            trainer_username: v.trainer_username,
            trainer_first_name: v.trainer_first_name,
            trainer_last_name: v.trainer_last_name,
            trainer_active: v.trainer_active,
            years: v.years.into_iter().map(Into::into).collect(),
        }
    }
}

fn coded_error(message: String, code: &'static str) -> async_graphql::Error {
    async_graphql::Error::new(message).extend_with(|_, extensions| extensions.set("code", code))
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Workload of one trainer, readable by that trainer only.
    async fn trainer_summary(
        &self,
        context: &Context<'_>,
        username: String,
    ) -> GqlResult<GqlTrainerSummary> {
        let state = context.data_unchecked::<AppState>();
        let requester = context
            .data_opt::<AuthenticatedUser>()
            .ok_or_else(|| coded_error("authentication required".into(), "UNAUTHENTICATED"))?;

        match state.summaries.get_summary(&username, requester).await {
            Ok(summary) => Ok(summary.into()),
            Err(error @ QueryError::Forbidden { .. }) => {
                Err(coded_error(error.to_string(), "FORBIDDEN"))
            }
            Err(error @ QueryError::NotFound(_)) => Err(coded_error(error.to_string(), "NOT_FOUND")),
            Err(error @ QueryError::Store(_)) => Err(coded_error(error.to_string(), "UNAVAILABLE")),
        }
    }
}
