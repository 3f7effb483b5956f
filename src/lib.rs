pub mod api;
pub mod chart_date;
pub mod config;
pub mod metric;
pub mod parser;
pub mod pipeline;
pub mod schema;
pub mod store;
