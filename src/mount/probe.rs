use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::cmd::{display_command, CommandRunner};
use crate::config::{Share, Transport};
use crate::paths::Layout;
use crate::report::Report;
use crate::script;

/// Mount the share on a scratch directory and unmount it again.
///
/// Returns `Ok(false)` when the mount is refused; the reason is already in
/// the report. `Err` is reserved for local failures (no scratch dir, no
/// `mount` binary).
pub fn probe(
    share: &Share,
    layout: &Layout,
    runner: &dyn CommandRunner,
    report: &dyn Report,
) -> Result<bool> {
    let transport = share.transport();
    let source = share.source();
    report.line(&format!("Testing {} path: {}", transport.label(), source));

    let dir = layout.probe_dir(transport);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let dir_arg = dir.to_string_lossy().to_string();

    // Leftover from an interrupted run
    runner.quiet("umount", &[dir_arg.clone()]);

    let mut args = vec![
        "-t".to_string(),
        share.fs_type().to_string(),
        source,
        dir_arg.clone(),
    ];
    if let Some(options) = share.probe_options() {
        args.push("-o".into());
        args.push(options);
    }

    report.line(&display_command("mount", &args));
    let out = runner.output("mount", &args)?;

    if !out.success() {
        report.line(&format!("{} test FAILED!", transport.label()));
        report.block(&out.stdout);
        report.block(&out.stderr);
        report.line(hint(transport));
        return Ok(false);
    }

    check_current_week(&dir, report);

    runner.quiet("umount", &[dir_arg]);
    report.line(&format!(
        "{} test succeeded. The server is reachable.",
        transport.label()
    ));

    Ok(true)
}

fn hint(transport: Transport) -> &'static str {
    match transport {
        Transport::Nfs => "Make sure the server address and the NFS export path are correct.",
        Transport::Cifs => {
            "Make sure the server, share, subfolder, username and password are correct."
        }
    }
}

/// Tell the admin whether clients will find an image today
fn check_current_week(mounted: &Path, report: &dyn Report) {
    let image = script::image_name(script::current_week());
    if mounted.join(&image).is_file() {
        report.line(&format!("Found this week's wallpaper on the share: {}", image));
    } else {
        report.line(&format!(
            "Warning: {} is not on the share yet. Clients keep their current wallpaper until it appears.",
            image
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryReport, ScriptedRunner};

    fn cifs() -> Share {
        Share::Cifs {
            server: "192.168.1.10".into(),
            share: "share".into(),
            subdir: "wallpapers".into(),
            username: "wallpaper".into(),
            password: "hunter2".into(),
            smb_version: "3.0".into(),
        }
    }

    #[test]
    fn nfs_probe_mounts_without_options() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let runner = ScriptedRunner::new();
        let report = MemoryReport::default();
        let share = Share::Nfs {
            server: "10.0.0.1".into(),
            export: "/srv/bg".into(),
        };

        assert!(probe(&share, &layout, &runner, &report).unwrap());

        let probe_dir = layout.probe_dir(Transport::Nfs);
        let probe_dir = probe_dir.display();
        assert!(dir.path().join("tmp/weekly-wallpaper-nfs-probe").is_dir());
        assert_eq!(
            runner.calls(),
            vec![
                format!("umount {}", probe_dir),
                format!("mount -t nfs 10.0.0.1:/srv/bg {}", probe_dir),
                format!("umount {}", probe_dir),
            ]
        );
        assert!(report.contains("NFS test succeeded"));
    }

    #[test]
    fn cifs_probe_passes_options_and_hides_password() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let runner = ScriptedRunner::new();
        let report = MemoryReport::default();

        assert!(probe(&cifs(), &layout, &runner, &report).unwrap());

        assert!(runner.calls()[1].ends_with("-o username=wallpaper,password=hunter2,vers=3.0,iocharset=utf8,ro"));
        assert!(!report.contains("hunter2"));
    }

    #[test]
    fn failed_mount_reports_and_skips_unmount() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let runner = ScriptedRunner::new().fail_when("mount -t cifs", 32, "mount error(13): Permission denied");
        let report = MemoryReport::default();

        assert!(!probe(&cifs(), &layout, &runner, &report).unwrap());
        assert_eq!(runner.calls().len(), 2);
        assert!(report.contains("Windows CIFS test FAILED!"));
        assert!(report.contains("Permission denied"));
        assert!(report.contains("username and password"));
    }

    #[test]
    fn reports_current_week_image() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let probe_dir = layout.probe_dir(Transport::Nfs);
        fs::create_dir_all(&probe_dir).unwrap();
        let image = script::image_name(script::current_week());
        fs::write(probe_dir.join(&image), b"jpeg").unwrap();

        let report = MemoryReport::default();
        let share = Share::Nfs {
            server: "a".into(),
            export: "/b".into(),
        };
        probe(&share, &layout, &ScriptedRunner::new(), &report).unwrap();
        assert!(report.contains(&format!("Found this week's wallpaper on the share: {}", image)));
    }

    #[test]
    fn warns_when_current_week_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let report = MemoryReport::default();
        let share = Share::Nfs {
            server: "a".into(),
            export: "/b".into(),
        };
        probe(&share, &Layout::new(dir.path()), &ScriptedRunner::new(), &report).unwrap();
        assert!(report.contains("is not on the share yet"));
    }
}
