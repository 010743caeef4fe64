// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Well-known private keys and the addresses they derive to.

/// `(private key, lowercase address)` pairs.
pub const TEST_ACCOUNTS: [(&str, &str); 3] = [
    (
        "0x0000000000000000000000000000000000000000000000000000000000000001",
        "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf",
    ),
    (
        "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        "0x2c7536e3605d9c16a7a3d7b1898e529396a65c23",
    ),
    (
        "0x0000000000000000000000000000000000000000000000000000000000000002",
        "0x2b5ad5c4795c026514f8317c7a215e218dccd6cf",
    ),
];

/// Just the private keys of [`TEST_ACCOUNTS`].
pub fn test_keys() -> Vec<&'static str> {
    TEST_ACCOUNTS.iter().map(|(key, _)| *key).collect()
}
