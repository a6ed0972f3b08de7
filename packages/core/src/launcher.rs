//! Local application launcher
//!
//! Runs the operations app inside its prebuilt virtual environment. The
//! environment is activated for the child process only, so this process's
//! own environment is never modified and nothing needs undoing afterwards,
//! whichever way the application exits.

use crate::config::LauncherConfig;
use crate::process::{exit_code, wait_interruptible};
use std::ffi::OsString;
use std::path::PathBuf;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LaunchError {
    /// The virtual environment was never created
    #[error("Virtual environment not found at {}", .venv.display())]
    SetupIncomplete { venv: PathBuf },

    #[error("Interpreter not found at {}", .0.display())]
    MissingInterpreter(PathBuf),

    #[error("Application entrypoint not found at {}", .0.display())]
    MissingEntrypoint(PathBuf),

    #[error("Failed to start {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LaunchError {
    /// Two lines telling the user how to finish local setup
    pub fn remediation(&self) -> Option<[String; 2]> {
        match self {
            LaunchError::SetupIncomplete { venv } => {
                let venv = venv.display();
                Some([
                    format!("Create it:  python3 -m venv {venv}"),
                    format!("Then run:   {venv}/bin/pip install -r requirements.txt"),
                ])
            }
            _ => None,
        }
    }
}

/// A virtual environment verified to exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivatedEnv {
    venv: PathBuf,
    bin_dir: PathBuf,
}

impl ActivatedEnv {
    /// `PATH` with the environment's bin directory first
    pub fn path_var(&self, current: Option<OsString>) -> OsString {
        let mut dirs = vec![self.bin_dir.clone()];
        if let Some(current) = current {
            dirs.extend(std::env::split_paths(&current));
        }
        std::env::join_paths(dirs).unwrap_or_else(|_| self.bin_dir.clone().into_os_string())
    }

    /// What `bin/activate` does, scoped to one command
    fn apply(&self, cmd: &mut Command) {
        cmd.env("VIRTUAL_ENV", &self.venv)
            .env("PATH", self.path_var(std::env::var_os("PATH")))
            .env_remove("PYTHONHOME");
    }
}

/// Runs the entrypoint with the venv's interpreter
#[derive(Debug, Clone)]
pub struct Launcher {
    venv_dir: PathBuf,
    entrypoint: PathBuf,
    python: String,
}

impl Launcher {
    pub fn from_config(config: &LauncherConfig) -> Self {
        Self {
            venv_dir: config.venv_dir.clone(),
            entrypoint: config.entrypoint.clone(),
            python: config.python.clone(),
        }
    }

    pub fn with_venv_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.venv_dir = dir.into();
        self
    }

    pub fn with_entrypoint(mut self, entrypoint: impl Into<PathBuf>) -> Self {
        self.entrypoint = entrypoint.into();
        self
    }

    /// Check local preconditions
    pub fn activate(&self) -> Result<ActivatedEnv, LaunchError> {
        if !self.venv_dir.is_dir() {
            return Err(LaunchError::SetupIncomplete {
                venv: self.venv_dir.clone(),
            });
        }
        let venv = self
            .venv_dir
            .canonicalize()
            .unwrap_or_else(|_| self.venv_dir.clone());
        let bin_dir = venv.join(bin_dir_name());
        let interpreter = bin_dir.join(&self.python);
        if !interpreter.exists() {
            return Err(LaunchError::MissingInterpreter(interpreter));
        }
        if !self.entrypoint.exists() {
            return Err(LaunchError::MissingEntrypoint(self.entrypoint.clone()));
        }
        Ok(ActivatedEnv { venv, bin_dir })
    }

    /// Run the application and return its exit code
    pub async fn run(&self, args: &[String]) -> Result<i32, LaunchError> {
        let env = self.activate()?;
        let program = env.bin_dir.join(&self.python);
        debug!(
            program = %program.display(),
            entrypoint = %self.entrypoint.display(),
            venv = %env.venv.display(),
            "launching application"
        );

        let mut cmd = Command::new(&program);
        cmd.arg(&self.entrypoint).args(args);
        env.apply(&mut cmd);

        let child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            program: program.clone(),
            source,
        })?;
        let output = wait_interruptible(child.wait_with_output())
            .await
            .map_err(|source| LaunchError::Spawn {
                program: program.clone(),
                source,
            })?;

        let code = exit_code(output.status);
        debug!(exit_code = code, "application exited");
        Ok(code)
    }
}

fn bin_dir_name() -> &'static str {
    if cfg!(windows) { "Scripts" } else { "bin" }
}
