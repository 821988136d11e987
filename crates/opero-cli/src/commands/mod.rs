pub mod demo;
pub mod error;
pub mod level;
pub mod prefs;
pub mod scheduler;
pub mod tasks;
mod utils;
