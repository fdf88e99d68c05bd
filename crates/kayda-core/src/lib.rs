//! Core library for `Kayda`.
//!
//! Holds the statute catalog (Acts, their Groups and Sections), accounts and
//! login sessions, all persisted as JSON documents through [`store::DocumentStore`].
//! This crate depends on `kayda-storage` for the storage backend trait and
//! knows nothing about HTTP.

pub mod accounts;
pub mod acts;
pub mod error;
pub mod groups;
pub mod models;
pub mod password;
pub mod sections;
pub mod store;

#[cfg(test)]
mod testing;
