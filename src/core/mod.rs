//! Core engine for bugcheck
//!
//! - **tag**: release tag classification (pre-release / development / final)
//! - **status**: tracker status lifecycle and its ordering
//! - **vcs**: version-control queries (`VcsClient`, system git backend)
//! - **mirror**: per-project mirrors and commit/tag resolution
//! - **change**: review changes and the tracker status each implies
//! - **reconcile**: tracker status vs. least advanced change
//! - **tracker** / **review**: read-only Bugzilla and Gerrit sources
//! - **config** / **context** / **error**: ambient plumbing

pub mod change;
pub mod config;
pub mod context;
pub mod error;
pub mod mirror;
pub mod reconcile;
pub mod review;
pub mod status;
pub mod tag;
pub mod tracker;
pub mod vcs;
