// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-CBC with PKCS#7 padding.
//!
//! CBC offers no integrity protection: a wrong key is only detected when the
//! padding of the last block happens to be invalid, which is why callers
//! also require the plaintext to be valid UTF-8.

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use keyrun_core::KeyrunError;
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

use crate::kdf::KEY_LEN;

/// Length of the CBC initialisation vector.
pub const IV_LEN: usize = 16;

type Encryptor = cbc::Encryptor<Aes256>;
type Decryptor = cbc::Decryptor<Aes256>;

/// Encrypt `plaintext` under `key` and `iv`.
pub fn encrypt(key: &[u8; KEY_LEN], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Vec<u8> {
    Encryptor::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypt `ciphertext` under `key` and `iv`.
///
/// Fails on a ciphertext that is not a whole number of blocks or whose
/// padding does not check out.
pub fn decrypt(
    key: &[u8; KEY_LEN],
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, KeyrunError> {
    Decryptor::new(key.into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| {
            KeyrunError::Crypto("decryption failed: wrong password or corrupted vault".to_string())
        })
}

/// Generate a random IV.
pub fn generate_iv() -> Result<[u8; IV_LEN], KeyrunError> {
    let mut iv = [0u8; IV_LEN];
    SystemRandom::new()
        .fill(&mut iv)
        .map_err(|_| KeyrunError::Crypto("failed to generate random IV".to_string()))?;
    Ok(iv)
}
