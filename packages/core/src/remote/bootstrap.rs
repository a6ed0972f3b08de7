//! Idempotent bootstrap of the target VM
//!
//! Every step queries the current remote state first and only runs its fix
//! action when the state differs from what is expected, so a bootstrap can be
//! repeated any number of times. Nothing is cached locally: each run queries
//! again.

use super::error::RemoteError;
use super::executor::{ExecutionResult, RemoteExecutor};
use super::quote::{self, RemoteCommand};
use super::transport::{RunRequest, Transport};
use crate::config::{Profile, TargetIdentity};
use tracing::{debug, info, warn};

/// What a satisfied state query looks like
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// First stdout line equals the value
    Equals(String),
    /// First stdout line is present
    NonEmpty,
    /// The query exits zero
    Succeeds,
}

impl Expectation {
    /// A failed query never satisfies an expectation
    pub fn is_met(&self, state: &Result<ExecutionResult, RemoteError>) -> bool {
        let Ok(result) = state else {
            return false;
        };
        match self {
            Expectation::Equals(value) => result.first_line() == Some(value.as_str()),
            Expectation::NonEmpty => result.first_line().is_some(),
            Expectation::Succeeds => true,
        }
    }
}

/// How a fix-action failure is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// Failure aborts the whole run
    Required,
    /// Failure is logged and the run continues
    BestEffort,
}

/// One query-compare-fix step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapStep {
    pub name: String,
    /// Read-only remote query line
    pub query: String,
    pub expect: Expectation,
    pub fix: RemoteCommand,
    pub policy: StepPolicy,
    /// The fix needs a human at a terminal (e.g. device-flow login)
    pub needs_terminal: bool,
}

/// Result of a single step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    AlreadySatisfied,
    Applied,
    /// Best-effort fix failed; the run continued
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub name: String,
    pub outcome: StepOutcome,
}

/// Outcome of a full bootstrap run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub steps: Vec<StepReport>,
}

impl BootstrapReport {
    /// Number of fix actions that ran successfully
    pub fn applied(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Applied)
            .count()
    }

    /// Best-effort steps that failed
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.steps.iter().filter_map(|s| match &s.outcome {
            StepOutcome::Failed(reason) => Some((s.name.as_str(), reason.as_str())),
            _ => None,
        })
    }
}

/// Progress callbacks for a bootstrap run
///
/// All methods have no-op defaults; the CLI uses them for spinners and for
/// the manual-intervention prompt.
pub trait BootstrapObserver {
    fn checking(&self, _step: &BootstrapStep) {}

    fn applying(&self, _step: &BootstrapStep) {}

    /// Asked before a terminal-bound fix runs; `false` aborts the step
    fn confirm_manual_step(&self, _step: &BootstrapStep) -> bool {
        true
    }

    fn finished(&self, _report: &StepReport) {}
}

/// Observer that ignores every event
pub struct Silent;

impl BootstrapObserver for Silent {}

/// Runs bootstrap steps against one target
pub struct Bootstrapper<'a, T> {
    executor: &'a RemoteExecutor<T>,
    target: &'a TargetIdentity,
    interactive: bool,
}

impl<'a, T: Transport> Bootstrapper<'a, T> {
    /// `interactive` says whether a human can answer terminal prompts
    pub fn new(
        executor: &'a RemoteExecutor<T>,
        target: &'a TargetIdentity,
        interactive: bool,
    ) -> Self {
        Self {
            executor,
            target,
            interactive,
        }
    }

    /// Query once, compare, fix if needed
    ///
    /// A failing query counts as "unset" so the fix still runs; its own
    /// failure is what decides the step.
    pub async fn ensure(
        &self,
        step: &BootstrapStep,
        observer: &dyn BootstrapObserver,
    ) -> Result<StepOutcome, RemoteError> {
        observer.checking(step);
        let state = self.executor.query(self.target, &step.query).await;
        if let Err(e) = &state {
            debug!(step = %step.name, error = %e, "state query failed; treating as unset");
        }

        if step.expect.is_met(&state) {
            info!(step = %step.name, "already satisfied");
            return Ok(StepOutcome::AlreadySatisfied);
        }

        let result = if step.needs_terminal
            && (!self.interactive || !observer.confirm_manual_step(step))
        {
            Err(RemoteError::ManualInterventionRequired(step.name.clone()))
        } else {
            observer.applying(step);
            self.apply(step).await
        };

        match (result, step.policy) {
            (Ok(()), _) => {
                info!(step = %step.name, "applied");
                Ok(StepOutcome::Applied)
            }
            (Err(e @ RemoteError::ManualInterventionRequired(_)), StepPolicy::Required) => Err(e),
            (Err(e), StepPolicy::Required) => Err(RemoteError::StepFailed {
                step: step.name.clone(),
                source: Box::new(e),
            }),
            (Err(e), StepPolicy::BestEffort) => {
                warn!(step = %step.name, error = %e, "best-effort step failed; continuing");
                Ok(StepOutcome::Failed(e.to_string()))
            }
        }
    }

    /// Run every step in order, stopping at the first required failure
    pub async fn run(
        &self,
        steps: &[BootstrapStep],
        observer: &dyn BootstrapObserver,
    ) -> Result<BootstrapReport, RemoteError> {
        let mut report = BootstrapReport::default();
        for step in steps {
            let outcome = self.ensure(step, observer).await?;
            let step_report = StepReport {
                name: step.name.clone(),
                outcome,
            };
            observer.finished(&step_report);
            report.steps.push(step_report);
        }
        Ok(report)
    }

    async fn apply(&self, step: &BootstrapStep) -> Result<(), RemoteError> {
        let line = step.fix.to_shell_line();
        // Terminal-bound fixes talk to the user; the rest stay quiet so
        // failures carry their stderr.
        let request = if step.needs_terminal {
            RunRequest::streamed(line).with_tty(true)
        } else {
            RunRequest::captured(line)
        };
        self.executor.run(self.target, &request).await.map(|_| ())
    }
}

/// The standard step plan for a profile: auth, project, then packages
pub fn plan_for_profile(profile: &Profile) -> Result<Vec<BootstrapStep>, RemoteError> {
    let mut steps = vec![
        auth_step(profile.account.as_deref())?,
        project_step(&profile.target.project)?,
    ];
    for package in &profile.packages {
        steps.push(package_step(package)?);
    }
    Ok(steps)
}

/// Active gcloud account on the VM; login uses the device flow
pub fn auth_step(account: Option<&str>) -> Result<BootstrapStep, RemoteError> {
    let mut login = vec!["gcloud", "auth", "login"];
    if let Some(account) = account {
        login.push(account);
    }
    login.push("--no-launch-browser");

    Ok(BootstrapStep {
        name: "auth".to_string(),
        query: quote::join(&[
            "gcloud",
            "auth",
            "list",
            "--filter=status:ACTIVE",
            "--format=value(account)",
        ]),
        expect: match account {
            Some(account) => Expectation::Equals(account.to_string()),
            None => Expectation::NonEmpty,
        },
        fix: RemoteCommand::new(login)?,
        policy: StepPolicy::Required,
        needs_terminal: true,
    })
}

/// Active gcloud project on the VM
pub fn project_step(project: &str) -> Result<BootstrapStep, RemoteError> {
    Ok(BootstrapStep {
        name: "project".to_string(),
        query: quote::join(&["gcloud", "config", "get-value", "project"]),
        expect: Expectation::Equals(project.to_string()),
        fix: RemoteCommand::new(["gcloud", "config", "set", "project", project])?,
        policy: StepPolicy::Required,
        needs_terminal: false,
    })
}

/// Optional system package
pub fn package_step(package: &str) -> Result<BootstrapStep, RemoteError> {
    Ok(BootstrapStep {
        name: format!("package:{package}"),
        query: quote::join(&["dpkg", "-s", package]),
        expect: Expectation::Succeeds,
        fix: RemoteCommand::new(["sudo", "apt-get", "install", "-y", package])?,
        policy: StepPolicy::BestEffort,
        needs_terminal: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::transport::RunOutput;
    use std::collections::BTreeSet;
    use std::convert::Infallible;
    use std::sync::Mutex;

    #[derive(Default)]
    struct VmState {
        account: Option<String>,
        project: Option<String>,
        packages: BTreeSet<String>,
    }

    /// In-memory VM understanding the commands the plan issues
    #[derive(Default)]
    struct FakeVm {
        state: Mutex<VmState>,
        mutations: Mutex<Vec<String>>,
        unreachable_queries: bool,
        broken_packages: BTreeSet<String>,
        failing_login: bool,
        attached: Mutex<usize>,
    }

    impl FakeVm {
        fn mutations(&self) -> Vec<String> {
            self.mutations.lock().unwrap().clone()
        }

        fn clear_mutations(&self) {
            self.mutations.lock().unwrap().clear();
        }
    }

    fn last_token(line: &str) -> String {
        line.rsplit(' ').next().unwrap_or_default().to_string()
    }

    fn ok(stdout: &str) -> RunOutput {
        RunOutput {
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    fn exit(code: i32) -> RunOutput {
        RunOutput {
            exit_code: code,
            stdout: String::new(),
            stderr: "failed".to_string(),
        }
    }

    impl Transport for FakeVm {
        async fn run(
            &self,
            _target: &TargetIdentity,
            request: &RunRequest,
        ) -> Result<RunOutput, RemoteError> {
            let line = request.line.as_str();
            let mut state = self.state.lock().unwrap();

            let is_query = line.starts_with("gcloud auth list")
                || line.starts_with("gcloud config get-value")
                || line.starts_with("dpkg -s");
            if is_query && self.unreachable_queries {
                return Ok(exit(255));
            }

            if line.starts_with("gcloud auth list") {
                return Ok(ok(state.account.as_deref().unwrap_or("")));
            }
            if line.starts_with("gcloud config get-value project") {
                return Ok(ok(state.project.as_deref().unwrap_or("")));
            }
            if line.starts_with("dpkg -s ") {
                let installed = state.packages.contains(&last_token(line));
                return Ok(if installed { ok("Status: install ok installed") } else { exit(1) });
            }

            self.mutations.lock().unwrap().push(line.to_string());
            if line.starts_with("gcloud auth login") {
                if self.failing_login {
                    return Ok(exit(1));
                }
                let account = line
                    .split(' ')
                    .nth(3)
                    .filter(|t| !t.starts_with("--"))
                    .unwrap_or("someone@example.com");
                state.account = Some(account.to_string());
                return Ok(ok(""));
            }
            if line.starts_with("gcloud config set project ") {
                state.project = Some(last_token(line));
                return Ok(ok(""));
            }
            if line.starts_with("sudo apt-get install -y ") {
                let package = last_token(line);
                if self.broken_packages.contains(&package) {
                    return Ok(exit(100));
                }
                state.packages.insert(package);
                return Ok(ok(""));
            }
            panic!("unexpected remote line: {line}");
        }

        fn attach(
            &self,
            _target: &TargetIdentity,
            _line: Option<&str>,
        ) -> Result<Infallible, RemoteError> {
            *self.attached.lock().unwrap() += 1;
            Err(RemoteError::Handoff(std::io::Error::other("test transport")))
        }
    }

    fn profile() -> Profile {
        Profile::new(TargetIdentity::new("europe-west1-b", "ops-vm", "acme-ops"))
            .with_account("ops@example.com")
            .with_packages(["kubectl", "jq"])
    }

    #[tokio::test]
    async fn second_run_performs_no_mutations() {
        let profile = profile();
        let executor = RemoteExecutor::new(FakeVm::default());
        let steps = plan_for_profile(&profile).unwrap();
        let bootstrapper = Bootstrapper::new(&executor, &profile.target, true);

        let first = bootstrapper.run(&steps, &Silent).await.unwrap();
        assert_eq!(first.applied(), 4);
        assert_eq!(
            executor.transport().mutations(),
            vec![
                "gcloud auth login ops@example.com --no-launch-browser",
                "gcloud config set project acme-ops",
                "sudo apt-get install -y kubectl",
                "sudo apt-get install -y jq",
            ]
        );

        executor.transport().clear_mutations();
        let second = bootstrapper.run(&steps, &Silent).await.unwrap();
        assert_eq!(second.applied(), 0);
        assert!(
            second
                .steps
                .iter()
                .all(|s| s.outcome == StepOutcome::AlreadySatisfied)
        );
        assert!(executor.transport().mutations().is_empty());
    }

    #[tokio::test]
    async fn failing_query_still_attempts_fix() {
        let profile = profile();
        let executor = RemoteExecutor::new(FakeVm {
            unreachable_queries: true,
            ..FakeVm::default()
        });
        let bootstrapper = Bootstrapper::new(&executor, &profile.target, true);
        let step = auth_step(profile.account.as_deref()).unwrap();

        let outcome = bootstrapper.ensure(&step, &Silent).await.unwrap();
        assert_eq!(outcome, StepOutcome::Applied);
        assert_eq!(
            executor.transport().mutations(),
            vec!["gcloud auth login ops@example.com --no-launch-browser"]
        );
    }

    #[tokio::test]
    async fn different_active_account_triggers_login() {
        let profile = profile();
        let vm = FakeVm::default();
        vm.state.lock().unwrap().account = Some("other@example.com".to_string());
        let executor = RemoteExecutor::new(vm);
        let bootstrapper = Bootstrapper::new(&executor, &profile.target, true);

        let step = auth_step(Some("ops@example.com")).unwrap();
        assert_eq!(
            bootstrapper.ensure(&step, &Silent).await.unwrap(),
            StepOutcome::Applied
        );
    }

    #[tokio::test]
    async fn any_account_satisfies_when_none_configured() {
        let profile = profile();
        let vm = FakeVm::default();
        vm.state.lock().unwrap().account = Some("other@example.com".to_string());
        let executor = RemoteExecutor::new(vm);
        let bootstrapper = Bootstrapper::new(&executor, &profile.target, false);

        let step = auth_step(None).unwrap();
        assert_eq!(
            bootstrapper.ensure(&step, &Silent).await.unwrap(),
            StepOutcome::AlreadySatisfied
        );
    }

    #[tokio::test]
    async fn best_effort_failure_is_recorded_and_run_continues() {
        let profile = profile();
        let executor = RemoteExecutor::new(FakeVm {
            broken_packages: BTreeSet::from(["kubectl".to_string()]),
            ..FakeVm::default()
        });
        let steps = plan_for_profile(&profile).unwrap();
        let report = Bootstrapper::new(&executor, &profile.target, true)
            .run(&steps, &Silent)
            .await
            .unwrap();

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "package:kubectl");
        assert!(failures[0].1.contains("status 100"));
        assert_eq!(report.steps.last().unwrap().outcome, StepOutcome::Applied);
    }

    #[tokio::test]
    async fn required_failure_aborts_remaining_steps() {
        let profile = profile();
        let executor = RemoteExecutor::new(FakeVm {
            failing_login: true,
            ..FakeVm::default()
        });
        let steps = plan_for_profile(&profile).unwrap();
        let err = Bootstrapper::new(&executor, &profile.target, true)
            .run(&steps, &Silent)
            .await
            .unwrap_err();

        match err {
            RemoteError::StepFailed { step, .. } => assert_eq!(step, "auth"),
            other => panic!("unexpected error: {other}"),
        }
        // Only the failed login ran; project and packages were never touched.
        assert_eq!(executor.transport().mutations().len(), 1);
    }

    #[tokio::test]
    async fn non_interactive_login_fails_fast() {
        let profile = profile();
        let executor = RemoteExecutor::new(FakeVm::default());
        let step = auth_step(profile.account.as_deref()).unwrap();
        let err = Bootstrapper::new(&executor, &profile.target, false)
            .ensure(&step, &Silent)
            .await
            .unwrap_err();

        assert!(matches!(err, RemoteError::ManualInterventionRequired(ref s) if s == "auth"));
        assert!(executor.transport().mutations().is_empty());
    }

    struct Declines;

    impl BootstrapObserver for Declines {
        fn confirm_manual_step(&self, _step: &BootstrapStep) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn declined_manual_step_is_not_run() {
        let profile = profile();
        let executor = RemoteExecutor::new(FakeVm::default());
        let step = auth_step(None).unwrap();
        let err = Bootstrapper::new(&executor, &profile.target, true)
            .ensure(&step, &Declines)
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::ManualInterventionRequired(_)));
        assert!(executor.transport().mutations().is_empty());
    }

    #[test]
    fn expectation_matching() {
        let result = Ok(ExecutionResult {
            exit_code: 0,
            stdout: "\n  acme-ops \n".to_string(),
        });
        assert!(Expectation::Equals("acme-ops".to_string()).is_met(&result));
        assert!(!Expectation::Equals("other".to_string()).is_met(&result));
        assert!(Expectation::NonEmpty.is_met(&result));
        assert!(Expectation::Succeeds.is_met(&result));

        let empty = Ok(ExecutionResult::default());
        assert!(!Expectation::NonEmpty.is_met(&empty));

        let failed = Err(RemoteError::RemoteCommand {
            exit_code: 1,
            stderr: String::new(),
        });
        assert!(!Expectation::Succeeds.is_met(&failed));
    }

    #[test]
    fn auth_query_quotes_format_argument() {
        let step = auth_step(None).unwrap();
        assert_eq!(
            step.query,
            "gcloud auth list --filter=status:ACTIVE '--format=value(account)'"
        );
        assert_eq!(step.expect, Expectation::NonEmpty);
        assert!(step.needs_terminal);
    }
}
