pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod observer;
pub mod server;
pub mod services;
pub mod types;

#[cfg(test)]
pub mod testing;
