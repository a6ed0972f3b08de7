//! Output utilities for CLI commands
//!
//! This module provides terminal output helpers: spinners with elapsed time
//! display for bootstrap steps, outcome colors, and rich error formatting.

pub mod colors;
pub mod errors;
pub mod spinner;

pub use colors::outcome_style;
pub use errors::{format_config_error, format_launch_error, format_remote_error, show_error};
pub use spinner::CommandSpinner;
