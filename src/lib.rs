pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod database;
pub mod drive;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod server;
pub mod session;
