// ABOUTME: Library root for the deliverables job poller
// ABOUTME: Exposes job parsing, progress derivation and the polling scheduler

pub mod cache;
pub mod config;
pub mod error;
pub mod poller;
pub mod presenter;
pub mod progress;
pub mod remote;

pub use error::PollerError;
pub use poller::{JobSource, PollScheduler, PollState, PollUpdate};
pub use progress::ProgressFractions;
pub use remote::models::JobSnapshot;
