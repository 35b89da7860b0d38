pub mod commands;
pub mod config;
pub mod http;
pub mod provider;
pub mod resources;
pub mod retry;
pub mod runtime;
pub mod state;
