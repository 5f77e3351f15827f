//! System dconf database entries that pin the wallpaper keys

use anyhow::{Context, Result};
use std::fs;

use crate::cmd::{self, CommandRunner};
use crate::config::SetupConfig;
use crate::desktop::Desktop;
use crate::paths::Layout;
use crate::report::Report;

const PROFILE_SYSTEM_DB: &str = "system-db:local";

/// Single-quoted GVariant text form of `value`
pub fn gvariant_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if matches!(c, '\'' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// Keyfile with the default picture options
pub fn render_defaults(desktop: Desktop, picture_options: &str) -> String {
    format!(
        "[{}]\npicture-options={}\n",
        desktop.schema_dir().trim_start_matches('/'),
        gvariant_string(picture_options)
    )
}

/// One locked key per line
pub fn render_locks(desktop: Desktop) -> String {
    let mut out = desktop.controlled_keys().join("\n");
    out.push('\n');
    out
}

/// Make sure user sessions read the `local` system database.
///
/// Locks under `db/local.d` do nothing unless the `user` profile lists it.
fn ensure_profile(layout: &Layout, report: &dyn Report) -> Result<()> {
    let path = layout.dconf_profile_path();

    if !path.exists() {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        report.line(&format!("Creating dconf profile {}...", path.display()));
        fs::write(&path, format!("user-db:user\n{}\n", PROFILE_SYSTEM_DB))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        return Ok(());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if content.lines().any(|l| l.trim() == PROFILE_SYSTEM_DB) {
        return Ok(());
    }

    report.line(&format!("Adding {} to {}...", PROFILE_SYSTEM_DB, path.display()));
    let mut updated = content;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(PROFILE_SYSTEM_DB);
    updated.push('\n');
    fs::write(&path, updated).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

fn update(runner: &dyn CommandRunner, report: &dyn Report) -> Result<()> {
    let out = cmd::run_logged(runner, report, "dconf", ["update"], false)?;
    if !out.success() {
        report.line("Warning: dconf update failed; the lock applies after the next successful update.");
    }
    Ok(())
}

/// Write defaults and locks, then rebuild the system database
pub fn apply_lock(
    config: &SetupConfig,
    layout: &Layout,
    runner: &dyn CommandRunner,
    report: &dyn Report,
) -> Result<()> {
    report.line("Applying dconf lock settings...");

    let locks = layout.dconf_locks_path();
    if let Some(dir) = locks.parent() {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let defaults = layout.dconf_defaults_path();
    fs::write(&defaults, render_defaults(config.desktop, &config.picture_options))
        .with_context(|| format!("Failed to write {}", defaults.display()))?;
    fs::write(&locks, render_locks(config.desktop))
        .with_context(|| format!("Failed to write {}", locks.display()))?;

    report.line(&format!(
        "Warning: dconf refuses writes to locked keys, including the login script's. \
         While locked, the system default applies to: {}.",
        config.desktop.image_keys().join(", ")
    ));

    ensure_profile(layout, report)?;
    update(runner, report)
}

/// Drop a lock left by an earlier run. Returns whether anything was removed.
pub fn remove_lock(layout: &Layout, runner: &dyn CommandRunner, report: &dyn Report) -> Result<bool> {
    let mut removed = false;
    for path in [layout.dconf_defaults_path(), layout.dconf_locks_path()] {
        if path.exists() {
            report.line(&format!("Removing {}...", path.display()));
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            removed = true;
        }
    }

    if removed {
        update(runner, report)?;
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Share;
    use crate::testing::{MemoryReport, ScriptedRunner};

    fn config() -> SetupConfig {
        SetupConfig::new(Share::Nfs {
            server: "a".into(),
            export: "/b".into(),
        })
    }

    #[test]
    fn defaults_keyfile() {
        assert_eq!(
            render_defaults(Desktop::Cinnamon, "scaled"),
            "[org/cinnamon/desktop/background]\npicture-options='scaled'\n"
        );
    }

    #[test]
    fn quotes_in_values_are_escaped() {
        assert_eq!(gvariant_string("scaled"), "'scaled'");
        assert_eq!(gvariant_string(r"it's\"), r"'it\'s\\'");
        assert!(render_defaults(Desktop::Gnome, "a'b").contains(r"picture-options='a\'b'"));
    }

    #[test]
    fn locks_list() {
        assert_eq!(
            render_locks(Desktop::Cinnamon),
            "/org/cinnamon/desktop/background/picture-uri\n\
             /org/cinnamon/desktop/background/picture-options\n"
        );
    }

    #[test]
    fn apply_lock_writes_files_and_updates() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let runner = ScriptedRunner::new();
        let report = MemoryReport::default();

        apply_lock(&config(), &layout, &runner, &report).unwrap();

        assert!(fs::read_to_string(layout.dconf_defaults_path())
            .unwrap()
            .contains("picture-options='scaled'"));
        assert!(fs::read_to_string(layout.dconf_locks_path())
            .unwrap()
            .contains("/picture-uri\n"));
        assert_eq!(
            fs::read_to_string(layout.dconf_profile_path()).unwrap(),
            "user-db:user\nsystem-db:local\n"
        );
        assert_eq!(runner.calls(), vec!["dconf update"]);
        assert!(report.contains(
            "dconf refuses writes to locked keys, including the login script's. \
             While locked, the system default applies to: picture-uri."
        ));
    }

    #[test]
    fn existing_profile_gains_local_db_once() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let profile = layout.dconf_profile_path();
        fs::create_dir_all(profile.parent().unwrap()).unwrap();
        fs::write(&profile, "user-db:user\nsystem-db:site").unwrap();

        let report = MemoryReport::default();
        apply_lock(&config(), &layout, &ScriptedRunner::new(), &report).unwrap();
        apply_lock(&config(), &layout, &ScriptedRunner::new(), &report).unwrap();

        assert_eq!(
            fs::read_to_string(&profile).unwrap(),
            "user-db:user\nsystem-db:site\nsystem-db:local\n"
        );
    }

    #[test]
    fn dconf_update_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new().fail_when("dconf update", 1, "error");
        let report = MemoryReport::default();

        apply_lock(&config(), &Layout::new(dir.path()), &runner, &report).unwrap();
        assert!(report.contains("Warning: dconf update failed"));
    }

    #[test]
    fn remove_lock_only_acts_on_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let runner = ScriptedRunner::new();
        let report = MemoryReport::default();

        assert!(!remove_lock(&layout, &runner, &report).unwrap());
        assert!(runner.calls().is_empty());

        apply_lock(&config(), &layout, &runner, &report).unwrap();
        assert!(remove_lock(&layout, &runner, &report).unwrap());
        assert!(!layout.dconf_locks_path().exists());
        assert!(!layout.dconf_defaults_path().exists());
        assert_eq!(runner.calls(), vec!["dconf update", "dconf update"]);
    }
}
