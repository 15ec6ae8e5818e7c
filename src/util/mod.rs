//! Filesystem helpers shared by the exporters and the cleanup stages.

pub mod fs;
