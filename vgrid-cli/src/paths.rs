//! Session log locations.
//!
//! Each run of the demo writes its own `session-<timestamp>.log` in a `logs`
//! directory under the platform cache directory. Older sessions are pruned
//! so only the most recent few remain.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use chrono::DateTime;
use chrono::Local;
use directories::ProjectDirs;

const SESSION_PREFIX: &str = "session-";
const SESSION_SUFFIX: &str = ".log";

/// Directory holding session logs, or `None` without a home directory.
///
/// - Linux: `$XDG_CACHE_HOME/vgrid/logs` or `~/.cache/vgrid/logs`
/// - macOS: `~/Library/Caches/dev.vgrid.vgrid/logs`
/// - Windows: `C:\Users\<User>\AppData\Local\vgrid\vgrid\cache\logs`
pub fn log_dir() -> Option<PathBuf> {
    ProjectDirs::from("dev", "vgrid", "vgrid").map(|dirs| dirs.cache_dir().join("logs"))
}

/// Log file for a session started at `started`.
///
/// Names sort in start order.
pub fn session_log(dir: &Path, started: DateTime<Local>) -> PathBuf {
    dir.join(format!(
        "{}{}{}",
        SESSION_PREFIX,
        started.format("%Y%m%d-%H%M%S"),
        SESSION_SUFFIX
    ))
}

/// Removes all but the `keep` newest session logs in `dir`.
///
/// Files that are not session logs are left alone, and a missing directory
/// has nothing to prune. Returns the number of logs removed.
pub fn prune_sessions(dir: &Path, keep: usize) -> io::Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(err),
    };

    let mut sessions = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if is_session_log(&path) {
            sessions.push(path);
        }
    }
    sessions.sort();

    let excess = sessions.len().saturating_sub(keep);
    for path in &sessions[..excess] {
        fs::remove_file(path)?;
    }
    Ok(excess)
}

fn is_session_log(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(SESSION_PREFIX) && name.ends_with(SESSION_SUFFIX))
}
