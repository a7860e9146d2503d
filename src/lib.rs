pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod expected;
pub mod fs_util;
pub mod identifier;
pub mod matcher;
pub mod output;
pub mod planner;
pub mod renamer;
pub mod report;
pub mod semantic;
pub mod stem;
