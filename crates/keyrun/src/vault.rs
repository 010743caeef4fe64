// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keyrun encrypt`, `keyrun decrypt`, and `keyrun vault` commands.

use std::path::Path;

use keyrun_config::FilesConfig;
use keyrun_core::KeyrunError;
use keyrun_vault::{
    Vault, confirm, get_vault_passphrase, get_vault_passphrase_with_confirm, write_secrets,
};

/// Encrypt the plaintext secrets file. An existing vault is only replaced
/// with `force` or an interactive yes.
pub async fn run_encrypt(files: &FilesConfig, force: bool) -> Result<(), KeyrunError> {
    encrypt_with(files, force, confirm).await
}

async fn encrypt_with(
    files: &FilesConfig,
    force: bool,
    ask: impl FnOnce(&str) -> Result<bool, KeyrunError>,
) -> Result<(), KeyrunError> {
    let vault = Vault::from_config(files);
    if vault.exists() && !force {
        let question = format!(
            "A vault already exists at {}. Overwrite it?",
            vault.vault_path().display()
        );
        if !ask(&question)? {
            eprintln!("encryption cancelled, existing vault left untouched");
            return Ok(());
        }
    }

    let passphrase = get_vault_passphrase_with_confirm()?;
    let record = vault.encrypt(&passphrase).await?;

    println!(
        "Encrypted {} keys into {}",
        record.keys.len(),
        vault.vault_path().display()
    );
    println!(
        "Plaintext moved to {}; delete it once you have verified the vault.",
        vault.backup_path().display()
    );
    Ok(())
}

/// Decrypt the vault and write the keys, one per line, to `output` or the
/// configured secrets path.
pub async fn run_decrypt(files: &FilesConfig, output: Option<&Path>) -> Result<(), KeyrunError> {
    let vault = Vault::from_config(files);
    if !vault.exists() {
        return Err(KeyrunError::Config(format!(
            "no vault found at {}",
            vault.vault_path().display()
        )));
    }

    let passphrase = get_vault_passphrase()?;
    let secrets = vault.decrypt(&passphrase).await?;
    let target = output.unwrap_or(files.secrets_path.as_path());
    write_secrets(target, &secrets).await?;

    println!("Decrypted {} keys into {}", secrets.len(), target.display());
    Ok(())
}

pub async fn run_status(files: &FilesConfig) -> Result<(), KeyrunError> {
    let vault = Vault::from_config(files);
    match vault.status().await? {
        Some(status) => {
            println!("Vault:   {}", vault.vault_path().display());
            println!("Entries: {}", status.entries);
            println!("Created: {}", status.created);
        }
        None => println!("No vault at {}", vault.vault_path().display()),
    }
    Ok(())
}

pub async fn run_delete(files: &FilesConfig, yes: bool) -> Result<(), KeyrunError> {
    delete_with(files, yes, confirm).await
}

async fn delete_with(
    files: &FilesConfig,
    yes: bool,
    ask: impl FnOnce(&str) -> Result<bool, KeyrunError>,
) -> Result<(), KeyrunError> {
    let vault = Vault::from_config(files);
    if !vault.exists() {
        println!("No vault at {}", vault.vault_path().display());
        return Ok(());
    }
    if !yes && !ask("Delete the vault? Keys are unrecoverable without a plaintext copy.")? {
        eprintln!("deletion cancelled");
        return Ok(());
    }
    if vault.delete().await? {
        println!("Deleted {}", vault.vault_path().display());
    }
    Ok(())
}
