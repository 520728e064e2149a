//! Size-triggered log rotation.
//!
//! The live file is opened lazily on the first write, so a logger pointed at an unwritable
//! directory still builds and every write reports the failure. When a write would push the
//! file past its limit, the file is renamed to a timestamped backup, a fresh one is opened,
//! and a retention pass prunes and compresses old backups.

use crate::cleanup::{self, RetentionPolicy, free_backup_path};
use crate::internal;
use chrono::Utc;

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

const MEGABYTE: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotateOptions {
    /// Size limit in MiB before rotation. Zero disables rotation.
    pub max_size_mb: u64,
    pub retention: RetentionPolicy,
}

impl Default for RotateOptions {
    fn default() -> Self {
        Self {
            max_size_mb: 100,
            retention: RetentionPolicy::default(),
        }
    }
}

/// Serializes all writes internally, so concurrent log calls never interleave within a line.
#[derive(Debug)]
pub struct RotatingWriter {
    path: PathBuf,
    options: RotateOptions,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    file: Option<File>,
    size: u64,
}

impl RotatingWriter {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, options: RotateOptions) -> Self {
        Self {
            path: path.into(),
            options,
            state: Mutex::new(State::default()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn options(&self) -> &RotateOptions {
        &self.options
    }

    const fn max_bytes(&self) -> u64 {
        self.options.max_size_mb.saturating_mul(MEGABYTE)
    }

    /// Appends `data` in a single write, rotating first if it would not fit.
    ///
    /// # Errors
    /// Directory creation, open, rename, or write failures; `FileTooLarge` when `data`
    /// alone exceeds the size limit.
    pub fn write_all(&self, data: &[u8]) -> Result<(), crate::Error> {
        let len = data.len() as u64;
        let max = self.max_bytes();
        if max > 0 && len > max {
            return Err(crate::Error::FileTooLarge { write: len, max });
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if state.file.is_none() {
            self.open_existing_or_new(&mut state, len)?;
        } else if max > 0 && state.size + len > max {
            self.rotate(&mut state)?;
        }

        let Some(file) = state.file.as_mut() else {
            return Err(crate::Error::Io(std::io::Error::other("log file not open")));
        };
        if let Err(e) = file.write_all(data) {
            // A failed append leaves the handle in an unknown state; reopen next time
            state.file = None;
            return Err(e.into());
        }
        state.size += len;
        Ok(())
    }

    /// Forces the next write to rotate, regardless of size.
    ///
    /// # Errors
    /// Rename or open failures.
    pub fn rotate_now(&self) -> Result<(), crate::Error> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.rotate(&mut state)
    }

    /// # Errors
    /// `fsync` failure on the open file.
    pub fn sync(&self) -> Result<(), crate::Error> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(file) = state.file.as_ref() {
            file.sync_data()?;
        }
        Ok(())
    }

    fn open_existing_or_new(&self, state: &mut State, write_len: u64) -> Result<(), crate::Error> {
        let max = self.max_bytes();
        match fs::metadata(&self.path) {
            Ok(meta) if max > 0 && meta.len() + write_len > max => self.rotate(state),
            Ok(meta) => {
                let file = OpenOptions::new().append(true).open(&self.path)?;
                state.file = Some(file);
                state.size = meta.len();
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => self.open_new(state),
            Err(e) => Err(e.into()),
        }
    }

    fn open_new(&self, state: &mut State) -> Result<(), crate::Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
            internal::debug("FILE", &format!("Created directory: {}", parent.display()));
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        state.file = Some(file);
        state.size = 0;
        Ok(())
    }

    fn rotate(&self, state: &mut State) -> Result<(), crate::Error> {
        state.file = None;
        let now = Utc::now();

        if self.path.exists() {
            let backup = free_backup_path(&self.path, now);
            fs::rename(&self.path, &backup)?;
            internal::debug("FILE", &format!("Rotated to {}", backup.display()));
        }

        self.open_new(state)?;

        // Retention failures must not fail the write that triggered rotation
        if let Err(e) = cleanup::enforce(&self.path, &self.options.retention, now) {
            internal::warn("FILE", &format!("Retention pass failed: {e}"));
        }
        Ok(())
    }
}
