//! System-wide XDG autostart entry for the wallpaper script

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::config::{SetupConfig, Transport};
use crate::desktop::Desktop;
use crate::paths::Layout;
use crate::report::Report;

pub fn render(exec: &str, transport: Transport, desktop: Desktop) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=Weekly Wallpaper ({label})\n\
         Comment=Applies this week's wallpaper from the {label} share at every login\n\
         Exec={exec}\n\
         OnlyShowIn={only}\n\
         X-GNOME-Autostart-enabled=true\n",
        label = transport.label(),
        exec = exec,
        only = desktop.only_show_in(),
    )
}

pub fn install(config: &SetupConfig, layout: &Layout, report: &dyn Report) -> Result<PathBuf> {
    let path = layout.autostart_path();
    report.line(&format!("Writing {}...", path.display()));

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let content = render(&layout.script_exec_path(), config.transport(), config.desktop);
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}
