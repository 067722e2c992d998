//! # StageSync API Library
//!
//! This library provides the core functionality for the StageSync API
//! service: OAuth platform connections, on-demand statistics sync, and the
//! HTTP surface that exposes both to the artist dashboard.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod oauth;
pub mod platforms;
pub mod repositories;
pub mod server;
pub mod sync;
pub mod telemetry;
pub use migration;
