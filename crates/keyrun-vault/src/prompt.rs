// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Passphrase acquisition via TTY prompt or the KEYRUN_VAULT_KEY environment variable.

use std::io::{BufRead, IsTerminal, Write};

use keyrun_core::KeyrunError;
use secrecy::SecretString;

/// The environment variable name for providing the vault passphrase.
pub const VAULT_KEY_ENV_VAR: &str = "KEYRUN_VAULT_KEY";

fn from_env() -> Option<SecretString> {
    std::env::var(VAULT_KEY_ENV_VAR)
        .ok()
        .filter(|key| !is_blank(key))
        .map(SecretString::from)
}

/// Whitespace-only passphrases are treated as missing.
fn is_blank(passphrase: &str) -> bool {
    passphrase.trim().is_empty()
}

fn read_hidden(label: &str) -> Result<String, KeyrunError> {
    eprint!("{label}");
    rpassword::read_password()
        .map_err(|e| KeyrunError::Config(format!("failed to read passphrase: {e}")))
}

fn no_passphrase() -> KeyrunError {
    KeyrunError::Config(format!(
        "no passphrase provided. Set {VAULT_KEY_ENV_VAR} or run interactively."
    ))
}

/// Get the vault passphrase for unlocking.
///
/// `KEYRUN_VAULT_KEY` wins over the interactive prompt. Empty passphrases
/// are rejected.
pub fn get_vault_passphrase() -> Result<SecretString, KeyrunError> {
    if let Some(key) = from_env() {
        return Ok(key);
    }
    if !std::io::stdin().is_terminal() {
        return Err(no_passphrase());
    }

    let passphrase = read_hidden("Vault passphrase: ")?;
    if is_blank(&passphrase) {
        return Err(KeyrunError::Config("empty passphrase not allowed".to_string()));
    }
    Ok(SecretString::from(passphrase))
}

/// Get a new vault passphrase, prompting twice when interactive.
pub fn get_vault_passphrase_with_confirm() -> Result<SecretString, KeyrunError> {
    if let Some(key) = from_env() {
        return Ok(key);
    }
    if !std::io::stdin().is_terminal() {
        return Err(no_passphrase());
    }

    let first = read_hidden("New vault passphrase: ")?;
    let second = read_hidden("Confirm vault passphrase: ")?;
    if first != second {
        return Err(KeyrunError::Config("passphrases do not match".to_string()));
    }
    if is_blank(&first) {
        return Err(KeyrunError::Config("empty passphrase not allowed".to_string()));
    }
    Ok(SecretString::from(first))
}

/// Ask a yes/no question on the terminal. Non-interactive sessions answer no.
pub fn confirm(question: &str) -> Result<bool, KeyrunError> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return Ok(false);
    }
    eprint!("{question} (y/n): ");
    std::io::stderr()
        .flush()
        .map_err(|e| KeyrunError::Internal(format!("failed to flush prompt: {e}")))?;

    let mut answer = String::new();
    stdin
        .lock()
        .read_line(&mut answer)
        .map_err(|e| KeyrunError::Internal(format!("failed to read answer: {e}")))?;
    Ok(parse_answer(&answer))
}

fn parse_answer(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
