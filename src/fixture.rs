//! Fixture loading and identity.
//!
//! A fixture's identity is the MD5 of its text with every whitespace
//! character removed, so re-indenting or changing line endings keeps it
//! stable while any content edit changes it.

use crate::error::{GradeError, Result};
use md5::{Digest, Md5};
use std::fs;
use std::path::Path;

pub fn load(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| GradeError::io(path, e))
}

/// Lowercase hex MD5 of `text` without whitespace.
pub fn checksum(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::encode(Md5::digest(stripped.as_bytes()))
}

/// Compare against a pinned checksum.
pub fn verify(text: &str, pinned: &str) -> Result<(), String> {
    let actual = checksum(text);
    if actual.eq_ignore_ascii_case(pinned) {
        Ok(())
    } else {
        Err(format!(
            "fixture was modified: checksum {} does not match {}",
            actual, pinned
        ))
    }
}
