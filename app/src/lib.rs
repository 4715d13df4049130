//! Vulnerable Bank terminal client.
//!
//! A ratatui front end for the intentionally insecure demo banking API.
//! The binary in `main.rs` owns the terminal; everything else lives here.

pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod dialog;
pub mod models;
pub mod navigation;
pub mod screens;
pub mod session;
pub mod storage;
pub mod validate;

#[cfg(test)]
mod test_support;

pub use app::{App, AppMessage};
