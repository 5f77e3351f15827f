use anyhow::{bail, Context, Result};
use std::process::{Command, Stdio};

use crate::report::Report;

/// Captured result of an external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Output {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Seam between the provisioning steps and the host's tools
pub trait CommandRunner: Send + Sync {
    /// Run to completion, capturing stdout and stderr
    fn output(&self, program: &str, args: &[String]) -> Result<Output>;

    /// Run and discard everything, including failures
    fn quiet(&self, program: &str, args: &[String]) {
        if let Err(e) = self.output(program, args) {
            tracing::debug!("{} failed: {}", program, e);
        }
    }
}

/// Runs commands on the live system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn output(&self, program: &str, args: &[String]) -> Result<Output> {
        tracing::debug!("{}", display_command(program, args));

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run {}", program))?;

        Ok(Output {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Shell-like rendering for the log, with `password=` values masked
pub fn display_command(program: &str, args: &[String]) -> String {
    let mut line = format!("$ {}", program);
    for arg in args {
        line.push(' ');
        line.push_str(&mask_password(arg));
    }
    line
}

fn mask_password(arg: &str) -> String {
    let Some(start) = arg.find("password=") else {
        return arg.to_string();
    };
    let value_start = start + "password=".len();
    let rest = &arg[value_start..];

    // mount.cifs escapes a literal comma as ",,"
    let mut end = rest.len();
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b',' {
            if bytes.get(i + 1) == Some(&b',') {
                i += 2;
                continue;
            }
            end = i;
            break;
        }
        i += 1;
    }

    format!("{}***{}", &arg[..value_start], &rest[end..])
}

/// Run a command and copy its command line and output to the report.
///
/// With `check`, a non-zero exit is an error; otherwise the caller inspects
/// the returned output.
pub fn run_logged<I, S>(
    runner: &dyn CommandRunner,
    report: &dyn Report,
    program: &str,
    args: I,
    check: bool,
) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

    report.line(&display_command(program, &args));
    let output = runner.output(program, &args)?;
    report.block(&output.stdout);
    report.block(&output.stderr);

    if check && !output.success() {
        bail!("{} failed with exit code {:?}", program, output.code);
    }

    Ok(output)
}

/// Tools the setup calls, checked before anything is changed
pub const REQUIRED_TOOLS: &[&str] = &["mount", "umount", "systemctl", "dconf"];

/// Fail if any of `tools` is missing from PATH
pub fn preflight(tools: &[&str]) -> Result<()> {
    let missing: Vec<&str> = tools
        .iter()
        .copied()
        .filter(|tool| which::which(tool).is_err())
        .collect();

    if !missing.is_empty() {
        bail!("Required tools not found in PATH: {}", missing.join(", "));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryReport, ScriptedRunner};

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn display_plain_command() {
        assert_eq!(
            display_command("systemctl", &args(&["enable", "--now", "mnt-wallpaper.mount"])),
            "$ systemctl enable --now mnt-wallpaper.mount"
        );
    }

    #[test]
    fn display_masks_password() {
        let line = display_command(
            "mount",
            &args(&[
                "-t",
                "cifs",
                "//srv/share",
                "/tmp/probe",
                "-o",
                "username=u,password=hunter2,vers=3.0,iocharset=utf8,ro",
            ]),
        );
        assert!(!line.contains("hunter2"));
        assert!(line.ends_with("-o username=u,password=***,vers=3.0,iocharset=utf8,ro"));
    }

    #[test]
    fn mask_handles_escaped_commas_and_tail() {
        assert_eq!(
            mask_password("password=a,,b,vers=3.0"),
            "password=***,vers=3.0"
        );
        assert_eq!(mask_password("username=u,password=last"), "username=u,password=***");
    }

    #[test]
    fn output_success_requires_zero() {
        assert!(Output { code: Some(0), ..Default::default() }.success());
        assert!(!Output { code: Some(32), ..Default::default() }.success());
        assert!(!Output { code: None, ..Default::default() }.success());
    }

    #[test]
    fn run_logged_checks_exit_code() {
        let runner = ScriptedRunner::new().fail_when("systemctl daemon-reload", 1, "boom");
        let report = MemoryReport::default();

        let err = run_logged(&runner, &report, "systemctl", ["daemon-reload"], true).unwrap_err();
        assert!(err.to_string().contains("exit code Some(1)"));
        assert_eq!(report.lines(), vec!["$ systemctl daemon-reload", "boom"]);

        let out = run_logged(&runner, &report, "systemctl", ["daemon-reload"], false).unwrap();
        assert_eq!(out.code, Some(1));
    }

    #[test]
    fn preflight_reports_missing_tools() {
        let err = preflight(&["weekwall-definitely-not-installed"]).unwrap_err();
        assert!(err.to_string().contains("weekwall-definitely-not-installed"));
    }

    #[test]
    fn system_runner_captures_output() {
        let out = SystemRunner.output("sh", &args(&["-c", "echo hi; echo err >&2; exit 3"])).unwrap();
        assert_eq!(out.stdout, "hi");
        assert_eq!(out.stderr, "err");
        assert_eq!(out.code, Some(3));
    }
}
