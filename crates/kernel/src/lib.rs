//! Sift Kernel Library
//!
//! Filtered, paginated entity listings over PostgreSQL. The main entry point
//! for running the server is the `sift` binary.

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod filter;
pub mod routes;
pub mod state;
