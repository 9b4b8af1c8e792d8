pub mod dashboard;
pub mod store;
