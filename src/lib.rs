pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod monitor;
pub mod server;
pub mod services;
pub mod types;
