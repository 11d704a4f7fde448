//! Narrowed git fetching.
//!
//! This crate fetches only the remote branches that matter to a clone:
//! - Listing local branches and the branches the remote advertises
//! - Reconciling them against the remote's default branch
//! - Fetching just the surviving refspecs
//! - Scheduling periodic runs in the user's crontab, with a rotating log

pub mod config;
pub mod constants;
pub mod error;
pub mod frequency;
pub mod git;
pub mod logfile;
pub mod output;
pub mod reconcile;
pub mod repo;
pub mod schedule;
pub mod setup;
