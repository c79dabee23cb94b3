pub mod app;
pub mod cli;
pub mod configuration;
pub mod context;
pub mod logging;
pub mod model;
pub mod rest;
pub mod storage;
