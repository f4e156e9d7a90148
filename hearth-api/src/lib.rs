//! # Hearth API Server Library
//!
//! HTTP surface of the Hearth community platform: events and check-in,
//! the book, video and article libraries, exec positions, accounts, and
//! analytics. Persistence and domain rules live in `hearth-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Validating JSON, query and path extractors
//! - `middleware`: Security headers
//! - `response`: Success envelope helpers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;
pub mod routes;
