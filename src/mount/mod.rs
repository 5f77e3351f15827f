mod probe;

pub use probe::probe;

use anyhow::{Context, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;

use crate::cmd::{self, CommandRunner};
use crate::config::{SetupConfig, Share};
use crate::paths::Layout;
use crate::report::Report;

/// Escape a path the way `systemd-escape --path` does
pub fn escape_path(path: &str) -> String {
    let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
    if components.is_empty() {
        return "-".into();
    }

    let joined = components.join("/");
    let mut out = String::with_capacity(joined.len());
    for (i, byte) in joined.bytes().enumerate() {
        match byte {
            b'/' => out.push('-'),
            b'.' if i == 0 => out.push_str("\\x2e"),
            b if b.is_ascii_alphanumeric() || matches!(b, b':' | b'_' | b'.') => {
                out.push(b as char)
            }
            b => out.push_str(&format!("\\x{:02x}", b)),
        }
    }
    out
}

/// Unit name systemd expects for a mount at `mount_point`
pub fn unit_name(mount_point: &str) -> String {
    format!("{}.mount", escape_path(mount_point))
}

/// systemd expands `%` specifiers in unit settings
fn unit_value(value: &str) -> String {
    value.replace('%', "%%")
}

pub fn render_unit(share: &Share, mount_point: &str) -> String {
    format!(
        "[Unit]\n\
         Description=Weekly wallpaper share ({label})\n\
         Wants=network-online.target\n\
         After=network-online.target\n\
         \n\
         [Mount]\n\
         What={what}\n\
         Where={where_}\n\
         Type={fs_type}\n\
         Options={options}\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n",
        label = share.transport().label(),
        what = unit_value(&share.source()),
        where_ = unit_value(mount_point),
        fs_type = share.fs_type(),
        options = unit_value(&share.mount_options()),
    )
}

/// Write the mount unit, reload systemd and start the mount.
///
/// A failing `enable --now` only warns: the unit stays installed and will be
/// retried at boot.
pub fn install_unit(
    config: &SetupConfig,
    layout: &Layout,
    runner: &dyn CommandRunner,
    report: &dyn Report,
) -> Result<String> {
    let name = unit_name(&config.mount_point);
    let path = layout.unit_path(&name);
    report.line(&format!("Writing {}...", path.display()));

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, render_unit(&config.share, &config.mount_point))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    // CIFS units carry the password
    let mode = if config.share.has_credentials() { 0o600 } else { 0o644 };
    fs::set_permissions(&path, fs::Permissions::from_mode(mode))
        .with_context(|| format!("Failed to set permissions on {}", path.display()))?;

    cmd::run_logged(runner, report, "systemctl", ["daemon-reload"], true)?;

    let out = cmd::run_logged(runner, report, "systemctl", ["enable", "--now", name.as_str()], false)?;
    if !out.success() {
        report.line(&format!(
            "Warning: {} failed to start. See `journalctl -u {}` for details.",
            name, name
        ));
    }

    Ok(name)
}
