// jurisguard/src/lib.rs
//! # JurisGuard CLI Application
//!
//! This crate provides the command-line interface for the JurisGuard PII
//! redaction engine: `secure` rewrites a document with placeholders and
//! `analyze` reports what would be redacted.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;
