// Library for tests to access modules

pub mod cli;
pub mod collector;
pub mod config;
pub mod credentials;
pub mod discourse;
pub mod error;
pub mod http;
pub mod jenkins;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod runner;
pub mod snapshot_repo;
pub mod version;
