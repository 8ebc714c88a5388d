//! Hashing utilities for content-addressed cache keys.
//!
//! This module provides:
//! - `Digest`: A full 64-character SHA-256 hex digest
//! - `DigestBuilder`: Unambiguous combination of several fields into one digest
//! - `hash_directory()`: Deterministic directory hashing
//! - `hash_file()`: Single file hashing
//! - `hash_bytes()`: Arbitrary byte hashing

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use walkdir::WalkDir;

/// A full 64-character SHA-256 digest.
///
/// Digests order lexicographically, which keeps maps and test output stable.
///
/// # Format
///
/// The digest is a lowercase hexadecimal string (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(pub String);

impl Digest {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for Digest {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Error while hashing files on disk.
#[derive(Debug, thiserror::Error)]
pub enum FileHashError {
  #[error("failed to walk directory: {message}")]
  WalkDir { message: String },

  #[error("failed to read file {path}: {message}")]
  ReadFile { path: String, message: String },

  #[error("failed to read symlink {path}: {message}")]
  ReadSymlink { path: String, message: String },
}

/// Combines tagged fields into a single SHA-256 digest.
///
/// Every field is written as `tag`, the payload length as a little-endian
/// `u64`, then the payload. Two different field sequences therefore never
/// produce the same byte stream, even when payloads contain separators.
pub struct DigestBuilder {
  hasher: Sha256,
}

impl DigestBuilder {
  /// Start a digest salted with a domain string.
  pub fn new(domain: &str) -> Self {
    let mut builder = Self { hasher: Sha256::new() };
    builder.field(b'D', domain.as_bytes());
    builder
  }

  /// Append one tagged field.
  pub fn field(&mut self, tag: u8, payload: &[u8]) -> &mut Self {
    self.hasher.update([tag]);
    self.hasher.update((payload.len() as u64).to_le_bytes());
    self.hasher.update(payload);
    self
  }

  pub fn str_field(&mut self, tag: u8, payload: &str) -> &mut Self {
    self.field(tag, payload.as_bytes())
  }

  pub fn finish(self) -> Digest {
    Digest(format!("{:x}", self.hasher.finalize()))
  }
}

/// Compute a deterministic hash of a directory's contents.
///
/// The hash includes:
/// - File contents (not metadata like timestamps or permissions)
/// - Directory structure
/// - Symlink targets
///
/// Entries are sorted by their raw relative path and written as
/// length-prefixed fields, so no file name can imitate another entry.
pub fn hash_directory(path: &Path) -> Result<Digest, FileHashError> {
  let mut entries: Vec<(Vec<u8>, u8, Vec<u8>)> = Vec::new();

  for entry in WalkDir::new(path).sort_by_file_name() {
    let entry = entry.map_err(|e| FileHashError::WalkDir { message: e.to_string() })?;
    let entry_path = entry.path();

    let rel_path = relative_bytes(entry_path.strip_prefix(path).unwrap_or(entry_path));

    // Skip the root directory itself
    if rel_path.is_empty() {
      continue;
    }

    let file_type = entry.file_type();
    let (tag, payload) = if file_type.is_file() {
      (b'F', hash_file(entry_path)?.0.into_bytes())
    } else if file_type.is_dir() {
      (b'D', Vec::new())
    } else if file_type.is_symlink() {
      let target = fs::read_link(entry_path).map_err(|e| FileHashError::ReadSymlink {
        path: entry_path.display().to_string(),
        message: e.to_string(),
      })?;
      (b'L', target.as_os_str().as_encoded_bytes().to_vec())
    } else {
      // Sockets, devices and the like carry no content
      continue;
    };

    entries.push((rel_path, tag, payload));
  }

  entries.sort_by(|a, b| a.0.cmp(&b.0));

  let mut builder = DigestBuilder::new("dir");
  for (rel_path, tag, payload) in &entries {
    builder.field(*tag, rel_path).field(b'C', payload);
  }

  Ok(builder.finish())
}

/// Relative path as raw bytes with `/` separators on every host.
fn relative_bytes(rel: &Path) -> Vec<u8> {
  let mut bytes = Vec::new();
  for (i, component) in rel.components().enumerate() {
    if i > 0 {
      bytes.push(b'/');
    }
    bytes.extend_from_slice(component.as_os_str().as_encoded_bytes());
  }
  bytes
}

/// Hash a file's contents.
pub fn hash_file(path: &Path) -> Result<Digest, FileHashError> {
  let mut file = fs::File::open(path).map_err(|e| FileHashError::ReadFile {
    path: path.display().to_string(),
    message: e.to_string(),
  })?;

  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(|e| FileHashError::ReadFile {
      path: path.display().to_string(),
      message: e.to_string(),
    })?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(Digest(format!("{:x}", hasher.finalize())))
}

/// Hash a path that may be either a file or a directory.
pub fn hash_path(path: &Path) -> Result<Digest, FileHashError> {
  if path.is_dir() {
    hash_directory(path)
  } else {
    hash_file(path)
  }
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> Digest {
  let mut hasher = Sha256::new();
  hasher.update(data);
  Digest(format!("{:x}", hasher.finalize()))
}
