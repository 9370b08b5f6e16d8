//! Utilities for configuration and build.
#![warn(missing_docs)]

use crate::error::Error;

/// build_version of program
pub fn build_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Expand path with "~" to absolute path.
pub fn expand_home<P>(path: P) -> Result<std::path::PathBuf, Error>
where P: AsRef<std::path::Path> {
    let Ok(stripped) = path.as_ref().strip_prefix("~") else {
        return Ok(path.as_ref().to_path_buf());
    };

    let Some(mut p) = home::home_dir() else {
        return Err(Error::HomeDirError);
    };

    p.push(stripped);

    Ok(p)
}

/// Create parent directory of a path if not exists.
pub fn ensure_parent_dir<P>(path: P) -> Result<(), Error>
where P: AsRef<std::path::Path> {
    let path = expand_home(path)?;
    let parent = path.parent().ok_or(Error::ParentDirError)?;
    if !parent.as_os_str().is_empty() && !parent.is_dir() {
        std::fs::create_dir_all(parent).map_err(|e| Error::CreateFileError(e.to_string()))?;
    };
    Ok(())
}

/// Bind a TCP listener on `addr`, `host:port`. Port 0 picks a free port.
pub fn bind(addr: &str) -> Result<std::net::TcpListener, Error> {
    let listener =
        std::net::TcpListener::bind(addr).map_err(|e| Error::BindError(format!("{addr}: {e}")))?;
    listener
        .set_nonblocking(true)
        .map_err(|e| Error::BindError(e.to_string()))?;
    Ok(listener)
}
