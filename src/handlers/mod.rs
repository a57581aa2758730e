pub mod items;
pub mod metrics;
