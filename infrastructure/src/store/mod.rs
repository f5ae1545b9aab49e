//! Durable plan catalogue on the local file system.

mod file_plan_store;

pub use file_plan_store::FilePlanStore;
