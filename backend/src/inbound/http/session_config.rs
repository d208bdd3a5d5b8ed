//! Session cookie settings derived from the runtime configuration.

use std::path::{Path, PathBuf};

use actix_web::cookie::{Key, SameSite};
use tracing::warn;
use zeroize::Zeroizing;

use crate::settings::RuntimeSettings;

/// Minimum bytes of key material accepted from a key file.
pub const SESSION_KEY_MIN_LEN: usize = 64;

/// Session settings handed to the session middleware.
pub struct SessionSettings {
    /// Signing and encryption key for cookie sessions.
    pub key: Key,
    pub cookie_secure: bool,
    pub same_site: SameSite,
}

/// Errors raised while loading session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    #[error("production requires RECIPEAPP_SESSION_KEY_FILE")]
    MissingKeyFile,
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
}

fn read_key(path: &Path) -> Result<Key, SessionConfigError> {
    let bytes = Zeroizing::new(std::fs::read(path).map_err(|source| {
        SessionConfigError::KeyRead {
            path: path.to_path_buf(),
            source,
        }
    })?);
    if bytes.len() < SESSION_KEY_MIN_LEN {
        return Err(SessionConfigError::KeyTooShort {
            path: path.to_path_buf(),
            length: bytes.len(),
            min_len: SESSION_KEY_MIN_LEN,
        });
    }
    Ok(Key::derive_from(&bytes))
}

/// Build session settings. Development runs without a key file get an
/// ephemeral key; production refuses to start.
pub fn session_settings(settings: &RuntimeSettings) -> Result<SessionSettings, SessionConfigError> {
    let key = match settings.session_key_file.as_deref() {
        Some(path) => read_key(path)?,
        None if settings.environment.is_development() => {
            warn!("no session key file configured; using an ephemeral key");
            Key::generate()
        }
        None => return Err(SessionConfigError::MissingKeyFile),
    };
    Ok(SessionSettings {
        key,
        cookie_secure: settings.cookie_secure,
        same_site: SameSite::Lax,
    })
}
