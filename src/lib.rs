pub mod api;
pub mod auth;
pub mod banner;
pub mod client;
pub mod commands;
pub mod config;
pub mod consts;
pub mod display;
pub mod error;
pub mod job;
pub mod logging;
pub mod spinner;
pub mod transcript;
