// ABOUTME: Clients for the media service and the core project service
// ABOUTME: Job documents are decoded and validated in the models module

pub mod client;
pub mod models;
pub mod project;

pub use client::JobStatusClient;
pub use models::{JobSnapshot, JobStatus};
pub use project::ProjectClient;
