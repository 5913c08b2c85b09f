//! Probe CLI for webview bridge backends.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
