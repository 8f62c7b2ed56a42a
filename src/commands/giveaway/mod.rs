pub mod formatters;
pub mod handlers;
pub mod manager;
pub mod models;
pub mod notifier;
pub mod persistence;
pub mod scheduler;
pub mod storage;
pub mod strategies;
pub mod util;
pub mod utils;
