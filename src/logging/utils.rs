use std::path::PathBuf;

/// Remove ANSI CSI sequences (`ESC [ ... final`) from `s`.
pub(crate) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            out.push(c);
            continue;
        }
        if chars.next_if_eq(&'[').is_some() {
            // Parameter and intermediate bytes run until a final byte in '@'..='~'.
            chars.by_ref().find(|b| ('@'..='~').contains(b));
        }
    }
    out
}

/// Path of the run log for `command`: `<cache dir>/dotlink/<command>.log`.
///
/// The directory is created on demand. `None` when there is no cache
/// directory or it cannot be created.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    let dir = dirs::cache_dir()?.join("dotlink");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir.join(format!("{command}.log")))
}

/// Current UTC time rendered with a `chrono` format string.
pub(super) fn now(format: &str) -> String {
    chrono::Utc::now().format(format).to_string()
}
