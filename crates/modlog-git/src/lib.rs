//! Modlog Git - Git history access for changelog generation
//!
//! This crate enumerates commits with the paths they touch, resolves
//! release tags and reads files at past revisions.

mod commits;
mod repository;
mod tags;
pub mod types;

pub use repository::{GitRepo, Result};
pub use types::{CommitInfo, TagInfo};
