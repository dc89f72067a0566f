pub mod config;
pub mod delivery;
pub mod domain;
pub mod fetch;
pub mod report;
pub mod schedule;
