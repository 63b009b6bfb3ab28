//! Shared helpers for command handlers.

use std::io::{self, IsTerminal};

use macdb_core::MacRecord;
use tracing::warn;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to ask on, refuses instead of blocking.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(io::Error::other(e)))
}

/// Warn about `WE` / `code` values outside the known sets. They are stored
/// regardless.
pub fn warn_unknown_codes(record: &MacRecord) {
    if record.connection_kind().is_none() {
        warn!(mac = %record.mac, value = %record.connection_type, "unknown connection type, expected W or E");
    }
    if record.device_class().is_none() {
        warn!(mac = %record.mac, value = %record.device_code, "unknown device code");
    }
}
