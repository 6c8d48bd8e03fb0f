//! # Taskboard API Server Library
//!
//! HTTP surface for the user, board and task services.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `clients`: HTTP clients for other services
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Extractors whose rejections use the API error format
//! - `routes`: API route handlers

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
