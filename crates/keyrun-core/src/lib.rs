// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for keyrun.
//!
//! Holds the error taxonomy shared by every crate in the workspace and the
//! line-oriented list file reader used for secrets, proxies, and prompts.

pub mod error;
pub mod list;

pub use error::KeyrunError;
pub use list::{parse_list, read_list_file, ListFilter};
