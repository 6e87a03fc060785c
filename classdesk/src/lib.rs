//! ClassDesk library
//!
//! Grading table state, calendar event mapping and the persistence that
//! backs them. The binary wraps this library in a JSON-lines bridge.

pub mod app;
pub mod calendar;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod grading;
pub mod services;
