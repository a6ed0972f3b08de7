//! Bootstrap-then-attach flow

use super::bootstrap::{BootstrapObserver, BootstrapReport, Bootstrapper, plan_for_profile};
use super::error::RemoteError;
use super::executor::RemoteExecutor;
use super::quote;
use super::transport::Transport;
use crate::config::Profile;
use std::convert::Infallible;

/// Options for [`bootstrap_and_attach`]
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachOptions {
    /// A human can answer prompts (stdin is a terminal)
    pub interactive: bool,
    /// Go straight to the session
    pub skip_bootstrap: bool,
}

/// Remote line that replaces the default login shell, if the profile sets one
pub fn session_line(profile: &Profile) -> Option<String> {
    profile
        .remote_shell
        .as_deref()
        .map(|shell| format!("exec {} -l", quote::quote(shell)))
}

/// Bootstrap the profile's VM, then hand the process over to a shell on it
///
/// `before_handoff` receives the bootstrap report and runs last in this
/// process; anything that must happen before the terminal changes hands
/// (spinner cleanup, summaries) belongs there. A required-step failure
/// returns before the handoff is attempted.
pub async fn bootstrap_and_attach<T, F>(
    executor: &RemoteExecutor<T>,
    profile: &Profile,
    options: AttachOptions,
    observer: &dyn BootstrapObserver,
    before_handoff: F,
) -> Result<Infallible, RemoteError>
where
    T: Transport,
    F: FnOnce(&BootstrapReport),
{
    let report = if options.skip_bootstrap {
        BootstrapReport::default()
    } else {
        let steps = plan_for_profile(profile)?;
        Bootstrapper::new(executor, &profile.target, options.interactive)
            .run(&steps, observer)
            .await?
    };

    before_handoff(&report);
    executor.handoff(&profile.target, session_line(profile).as_deref())
}
