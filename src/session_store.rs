//! Purpose: Persist the session token between CLI invocations.
//! Exports: `default_session_path`, `load_token`, `save_token`, `clear_token`.
//! Role: Keep CLI session handling in one place with one file format.
//! Invariants: The default session file lives at `~/.domreg/session`.
//! Invariants: On Unix the session file is readable by the owning user only.

use domreg::api::{Error, ErrorKind};
use std::path::{Path, PathBuf};

pub(crate) fn default_session_path() -> PathBuf {
    let home = std::env::var_os("HOME").unwrap_or_default();
    PathBuf::from(home).join(".domreg").join("session")
}

/// Stored token, or `None` when no session file exists or it is empty.
pub(crate) fn load_token(path: &Path) -> Result<Option<String>, Error> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(Error::new(map_io_error_kind(&err))
                .with_message(format!("failed to read session file {}", path.display()))
                .with_source(err));
        }
    };
    let token = text.trim();
    if token.is_empty() {
        return Ok(None);
    }
    Ok(Some(token.to_string()))
}

pub(crate) fn save_token(path: &Path, token: &str) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| {
            Error::new(map_io_error_kind(&err))
                .with_message(format!(
                    "failed to create session directory {}",
                    parent.display()
                ))
                .with_source(err)
        })?;
    }
    std::fs::write(path, format!("{token}\n")).map_err(|err| {
        Error::new(map_io_error_kind(&err))
            .with_message(format!("failed to write session file {}", path.display()))
            .with_source(err)
    })?;
    restrict_to_owner(path)
}

/// Forget the stored token. Missing file is not an error.
pub(crate) fn clear_token(path: &Path) -> Result<(), Error> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(Error::new(map_io_error_kind(&err))
            .with_message(format!("failed to remove session file {}", path.display()))
            .with_source(err)),
    }
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> Result<(), Error> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(|err| {
        Error::new(map_io_error_kind(&err))
            .with_message(format!(
                "failed to restrict session file permissions {}",
                path.display()
            ))
            .with_source(err)
    })
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> Result<(), Error> {
    Ok(())
}

fn map_io_error_kind(err: &std::io::Error) -> ErrorKind {
    match err.kind() {
        std::io::ErrorKind::NotFound => ErrorKind::NotFound,
        std::io::ErrorKind::PermissionDenied => ErrorKind::Permission,
        _ => ErrorKind::Io,
    }
}
