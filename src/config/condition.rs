//! Load-time conditions attached to manifest entries.
use serde::Deserialize;

use crate::platform::Platform;

/// When an entry applies. Evaluated once while the manifest is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// Everywhere.
    #[default]
    Always,
    /// Only on Linux.
    Linux,
    /// Only on macOS.
    Macos,
    /// Only outside an SSH session.
    Local,
    /// Only inside an SSH session.
    Remote,
}

impl Condition {
    /// Whether the condition holds on `platform`.
    #[must_use]
    pub fn holds(self, platform: &Platform) -> bool {
        match self {
            Self::Always => true,
            Self::Linux => platform.is_linux(),
            Self::Macos => platform.is_macos(),
            Self::Local => !platform.is_remote,
            Self::Remote => platform.is_remote,
        }
    }
}
