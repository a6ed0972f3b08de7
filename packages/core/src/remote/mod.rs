//! Remote operations on the target VM
//!
//! This module provides:
//! - Shell quoting of structured argument lists
//! - The tunnel transport (`gcloud compute ssh`) behind a trait seam
//! - A command executor that classifies connection vs. command failures
//! - Idempotent bootstrap steps (auth, project, packages)
//! - Process handoff to an interactive remote shell

pub mod bootstrap;
mod error;
pub mod executor;
mod handoff;
pub mod quote;
pub mod session;
pub mod transport;

pub use bootstrap::{
    BootstrapObserver, BootstrapReport, BootstrapStep, Bootstrapper, Expectation, Silent,
    StepOutcome, StepPolicy, StepReport, plan_for_profile,
};
pub use error::{RemoteError, SSH_CONNECTION_FAILURE};
pub use executor::{ExecutionResult, RemoteExecutor, project_prefixed_line};
pub use handoff::replace_process;
pub use quote::{ExecMode, RemoteCommand};
pub use session::{AttachOptions, bootstrap_and_attach, session_line};
pub use transport::{GcloudTransport, OutputMode, RunOutput, RunRequest, Transport};
