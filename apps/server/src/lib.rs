//! Hiring warehouse server library.
//!
//! Loads departments, jobs and hired employees CSV files into the warehouse
//! and serves two hiring reports computed there.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
