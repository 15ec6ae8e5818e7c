//! Library to backup a website installation.
//!
//! A backup collects the site's database dump, virtual host configurations,
//! extra files and the crontab and SSH keys of shell users in a staging
//! directory inside the site, then archives the whole site into a single
//! `.tar.gz`. The individual exports are located in the [`exporters`] module,
//! the sequencing in [`pipeline`].

#![forbid(unsafe_code)]

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod exporters;
pub mod job;
pub mod pipeline;
pub mod staging;
pub mod system;
pub mod util;

pub use error::{Error, ErrorKind, Result};
pub use pipeline::{Outcome, Pipeline};
