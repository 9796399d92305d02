//! CLI commands for bugcheck
//!
//! - **audit**: compare tracker records with their review changes
//! - **resolve**: resolve one change to merge commit, tag and implied status
//! - **tag**: classify release tag names
//! - **init**: write a default bugcheck.toml
//!
//! Commands that talk to mirrors take `&AuditContext` so the mirror store is
//! shared for the whole run.

pub mod audit;
pub mod init;
pub mod resolve;
pub mod tag;

pub use audit::run_audit;
pub use init::run_init;
pub use resolve::run_resolve;
pub use tag::run_tag;
