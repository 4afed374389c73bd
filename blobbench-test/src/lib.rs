//! Test utilities for the benchmark driver and its storage clients.
//!
//! This crate provides utilities to facilitate testing of benchmark runs. See the modules for all
//! available utilities.

pub mod client;
pub mod tracing;
