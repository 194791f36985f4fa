pub mod config;
pub mod history;
pub mod search;
pub mod timer;
