//! Core types and shared plumbing.
//!
//! The pure half (curriculum, record, engine, views) has no I/O. The rest is the
//! storage and configuration plumbing the subsystems in `plugins` build on.

pub mod assets;
pub mod broker;
pub mod config;
pub mod curriculum;
pub mod db;
pub mod engine;
pub mod error;
pub mod record;
pub mod schemas;
pub mod store;
pub mod time;
pub mod views;
