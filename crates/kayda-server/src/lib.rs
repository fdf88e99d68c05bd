//! `Kayda` HTTP server.
//!
//! Wires together the core repositories, storage backend, and HTTP routes
//! into a running Axum server serving the JSON API for acts, groups,
//! sections and accounts.

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
