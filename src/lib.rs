#![forbid(unsafe_code)]

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod file_store;
pub mod logging;
pub mod maintenance;
pub mod model;
pub mod session;
pub mod storage;
pub mod validation;
