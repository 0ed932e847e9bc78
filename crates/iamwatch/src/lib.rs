//! iamwatch - AWS IAM user watcher
//!
//! This crate collects the configuration of every IAM user across a set of
//! AWS accounts and packages it as change items for an audit engine.

pub mod aws;
pub mod config;
pub mod watcher;
