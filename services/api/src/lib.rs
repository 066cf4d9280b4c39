//! services/api/src/lib.rs
//!
//! The storefront API service: configuration, storage adapters and the Axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
