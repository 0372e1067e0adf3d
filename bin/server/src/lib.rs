//! marquee session and access-control server.
//!
//! This crate provides the HTTP surface of the marquee ticketing
//! platform's credential pipeline: login, logout, session introspection,
//! and the route-guard middleware.

pub mod auth;
pub mod config;
