pub mod app;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod history;
pub mod output;
pub mod store;
pub mod transfer;
