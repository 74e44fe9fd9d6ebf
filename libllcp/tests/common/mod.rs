// Shared helpers for the integration tests. Each aggregated test file pulls
// this module in through `#[path]`, so not every helper is used everywhere.
#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;
