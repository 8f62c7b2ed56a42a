pub mod context;
pub mod giveaway;
pub mod help;

// Re-exports for the later usage in main.rs
pub use crate::commands::giveaway::handlers::giveaway as giveaway_command;
pub use crate::commands::help::help as help_command;
