use std::path::PathBuf;

use crate::config::Transport;

/// Directory holding administrator-provided systemd units
pub const SYSTEMD_UNIT_DIR: &str = "etc/systemd/system";

/// Wallpaper script run at every login
pub const SCRIPT_PATH: &str = "usr/local/bin/weekly-wallpaper.sh";

/// System-wide XDG autostart entry
pub const AUTOSTART_PATH: &str = "etc/xdg/autostart/weekly-wallpaper.desktop";

/// dconf system database keyfile directory
pub const DCONF_DB_DIR: &str = "etc/dconf/db/local.d";

/// dconf defaults keyfile for the background schema
pub const DCONF_DEFAULTS_FILE: &str = "00-background";

/// dconf lock list for the background schema
pub const DCONF_LOCKS_FILE: &str = "locks/background";

/// dconf profile consulted for regular user sessions
pub const DCONF_USER_PROFILE: &str = "etc/dconf/profile/user";

/// Where artifacts land on disk.
///
/// Every path is resolved under `root`, which is `/` on a live system.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve an absolute system path (e.g. a mount point) under the root
    pub fn resolve(&self, absolute: &str) -> PathBuf {
        self.root.join(absolute.trim_start_matches('/'))
    }

    pub fn unit_path(&self, unit_name: &str) -> PathBuf {
        self.root.join(SYSTEMD_UNIT_DIR).join(unit_name)
    }

    pub fn script_path(&self) -> PathBuf {
        self.root.join(SCRIPT_PATH)
    }

    /// Script location as seen by the running system (for `Exec=`)
    pub fn script_exec_path(&self) -> String {
        format!("/{}", SCRIPT_PATH)
    }

    pub fn autostart_path(&self) -> PathBuf {
        self.root.join(AUTOSTART_PATH)
    }

    pub fn dconf_db_dir(&self) -> PathBuf {
        self.root.join(DCONF_DB_DIR)
    }

    pub fn dconf_defaults_path(&self) -> PathBuf {
        self.dconf_db_dir().join(DCONF_DEFAULTS_FILE)
    }

    pub fn dconf_locks_path(&self) -> PathBuf {
        self.dconf_db_dir().join(DCONF_LOCKS_FILE)
    }

    pub fn dconf_profile_path(&self) -> PathBuf {
        self.root.join(DCONF_USER_PROFILE)
    }

    /// Scratch mount point for the reachability test
    pub fn probe_dir(&self, transport: Transport) -> PathBuf {
        self.root
            .join("tmp")
            .join(format!("weekly-wallpaper-{}-probe", transport.fs_type()))
    }
}
