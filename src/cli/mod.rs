pub mod account;
pub mod app;
pub mod commands;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod demo;
pub mod dispatch;
pub mod draft;
pub mod env;
pub mod output;
pub mod report;
pub mod runtime;
pub mod simulate;
