// Composition root for the workload context.
//
// Responsibilities
// - Read config from the environment.
// - Instantiate the in-memory channel and summary store.
// - Wire them into the publish, apply and query use cases.
// - Spawn one consumer worker per channel partition.

pub mod config;
pub mod graphql;
pub mod http;
pub mod state;
pub mod workers;
