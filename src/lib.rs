pub mod adjust;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod iface;
pub mod interrupt;
pub mod persist;
pub mod probe;
pub mod prompt;
pub mod store;
pub mod tools;
