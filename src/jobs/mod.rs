//! Job tracking module
//!
//! This module contains the job status types and the in-memory registry that
//! the service surface queries while crawls run in the background.

mod registry;
mod status;

pub use registry::{JobId, JobRegistry};
pub use status::{JobSnapshot, JobStatus};
