//! Credential persistence between CLI invocations.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default session location relative to the user's home directory.
const SESSION_DIR: &str = ".postdesk";
const SESSION_FILE: &str = "session.json";

/// Credential acquired at login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token attached to authorised requests.
    pub token: String,
    /// User profile echoed by the login endpoint.
    #[serde(default)]
    pub user: Value,
}

/// Errors raised while reading or writing the session file.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Filesystem access failed.
    #[error("failed to access session file {}", .path.display())]
    Io {
        /// Session file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The session file did not contain a valid session.
    #[error("session file {} is corrupt", .path.display())]
    Decode {
        /// Session file path.
        path: PathBuf,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
    /// The session could not be serialised.
    #[error("failed to encode session")]
    Encode {
        /// Underlying encode error.
        #[source]
        source: serde_json::Error,
    },
}

/// JSON file holding the current [`Session`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store backed by an explicit file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.postdesk/session.json`, when a home directory is known.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        BaseDirs::new().map(|dirs| dirs.home_dir().join(SESSION_DIR).join(SESSION_FILE))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session; a missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or decoded.
    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| SessionError::Decode {
                path: self.path.clone(),
                source,
            })
    }

    /// Persist a session, creating parent directories as needed.
    ///
    /// On unix the file is created owner-only (`0600`).
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| SessionError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        let payload =
            serde_json::to_vec_pretty(session).map_err(|source| SessionError::Encode { source })?;
        open_private(&self.path)
            .and_then(|mut file| file.write_all(&payload))
            .map_err(|source| SessionError::Io {
                path: self.path.clone(),
                source,
            })?;
        tracing::info!(path = %self.path.display(), "session stored");
        Ok(())
    }

    /// Remove the stored session. Returns whether a file was removed.
    ///
    /// # Errors
    ///
    /// Returns an error when an existing file cannot be removed.
    pub fn clear(&self) -> Result<bool, SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(SessionError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

fn open_private(path: &Path) -> io::Result<fs::File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    std::os::unix::fs::OpenOptionsExt::mode(&mut options, 0o600);
    let file = options.open(path)?;
    // `mode` only applies when the file is created.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    Ok(file)
}
