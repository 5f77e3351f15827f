//! Login script that copies this week's image and applies it

use anyhow::{Context, Result};
use chrono::Datelike;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use crate::config::SetupConfig;
use crate::dconf;
use crate::desktop::Desktop;
use crate::paths::Layout;
use crate::report::Report;

/// Images on the share are named `week01.jpg` .. `week53.jpg`
pub const IMAGE_PREFIX: &str = "week";
pub const IMAGE_EXTENSION: &str = "jpg";

/// ISO 8601 week of today, the same number `date +%V` prints
pub fn current_week() -> u32 {
    chrono::Local::now().iso_week().week()
}

pub fn image_name(week: u32) -> String {
    format!("{}{:02}.{}", IMAGE_PREFIX, week, IMAGE_EXTENSION)
}

/// Escape for use inside a double-quoted shell string
fn dq_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn render(mount_point: &str, desktop: Desktop, picture_options: &str) -> String {
    let mut writes = String::new();
    for key in desktop.image_keys() {
        writes.push_str(&format!(
            "    dconf write {}/{} \"'{}'\"\n",
            desktop.schema_dir(),
            key,
            desktop.image_value("$LOCAL_IMG")
        ));
    }
    writes.push_str(&format!(
        "    dconf write {}/picture-options \"{}\"\n",
        desktop.schema_dir(),
        dq_escape(&dconf::gvariant_string(picture_options))
    ));

    format!(
        r#"#!/bin/bash

# ISO week number (01-53)
WEEK_NUM=$(date +%V)

# Image for this week on the network share
REMOTE_IMG="{mount}/{prefix}${{WEEK_NUM}}.{ext}"

# Per-user copy
LOCAL_DIR="$HOME/.local/share/backgrounds"
LOCAL_IMG="$LOCAL_DIR/{prefix}${{WEEK_NUM}}.{ext}"

mkdir -p "$LOCAL_DIR"

if [ -f "$REMOTE_IMG" ]; then
    cp "$REMOTE_IMG" "$LOCAL_IMG"
    chown "$USER:" "$LOCAL_IMG"

{writes}else
    echo "No wallpaper found for this week: $REMOTE_IMG"
fi
"#,
        mount = dq_escape(mount_point),
        prefix = IMAGE_PREFIX,
        ext = IMAGE_EXTENSION,
        writes = writes,
    )
}

/// Write the script and make it executable
pub fn install(config: &SetupConfig, layout: &Layout, report: &dyn Report) -> Result<PathBuf> {
    let path = layout.script_path();
    report.line(&format!("Writing {}...", path.display()));

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let content = render(&config.mount_point, config.desktop, &config.picture_options);
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("Failed to make {} executable", path.display()))?;

    Ok(path)
}
