// Attribution inference engine
// Pipeline: load conversions/airings → score partial signals → combine
// with renormalized weights → append result → fan out alerts.

pub mod combiner;
pub mod engine;
pub mod handlers;
pub mod signals;
pub mod store;
