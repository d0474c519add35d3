//! # LinkVault API Server Library
//!
//! HTTP surface of the LinkVault authentication core.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `cookie`: Refresh token cookie transport
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers and login rate limiting
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod cookie;
pub mod error;
pub mod middleware;
pub mod routes;
