pub mod batch;
pub mod classify;
pub mod health;
pub mod metrics;
pub mod models;
pub mod page;
