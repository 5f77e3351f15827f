use anyhow::{Context, Result};
use std::fs;
use thiserror::Error;

use crate::autostart;
use crate::cmd::CommandRunner;
use crate::config::{SetupConfig, Transport};
use crate::dconf;
use crate::mount;
use crate::paths::Layout;
use crate::report::Report;
use crate::script;

const STEPS: usize = 6;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProvisionError {
    #[error("{} connection test failed, setup stopped", .0.label())]
    ProbeFailed(Transport),
}

/// Runs the setup steps in order; the first error stops the run
pub struct Provisioner<'a> {
    config: SetupConfig,
    layout: Layout,
    runner: &'a dyn CommandRunner,
    report: &'a dyn Report,
}

impl<'a> Provisioner<'a> {
    /// `config` is expected to be validated already
    pub fn new(
        config: SetupConfig,
        layout: Layout,
        runner: &'a dyn CommandRunner,
        report: &'a dyn Report,
    ) -> Self {
        Self {
            config,
            layout,
            runner,
            report,
        }
    }

    pub fn run(&self) -> Result<()> {
        self.report.line(&format!(
            ">>> Starting {} weekly wallpaper setup...",
            self.config.transport().label()
        ));

        self.test_share()?;
        self.create_mount_point()?;
        self.install_unit()?;
        self.install_script()?;
        self.install_autostart()?;
        self.configure_lock()?;

        self.report
            .line(">>> Setup complete. Log in as any user to check the wallpaper.");
        Ok(())
    }

    fn step(&self, n: usize, what: &str) {
        self.report.line(&format!("[{}/{}] {}", n, STEPS, what));
    }

    fn test_share(&self) -> Result<()> {
        self.step(1, "Testing the share");
        let reachable = mount::probe(&self.config.share, &self.layout, self.runner, self.report)?;
        if !reachable {
            return Err(ProvisionError::ProbeFailed(self.config.transport()).into());
        }
        Ok(())
    }

    fn create_mount_point(&self) -> Result<()> {
        self.step(2, "Creating the mount point");
        let dir = self.layout.resolve(&self.config.mount_point);
        self.report
            .line(&format!("Creating mount directory: {}", self.config.mount_point));
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))
    }

    fn install_unit(&self) -> Result<()> {
        self.step(3, "Installing the systemd mount unit");
        mount::install_unit(&self.config, &self.layout, self.runner, self.report)?;
        Ok(())
    }

    fn install_script(&self) -> Result<()> {
        self.step(4, "Installing the weekly wallpaper script");
        script::install(&self.config, &self.layout, self.report)?;
        Ok(())
    }

    fn install_autostart(&self) -> Result<()> {
        self.step(5, "Installing the autostart entry for all users");
        autostart::install(&self.config, &self.layout, self.report)?;
        Ok(())
    }

    fn configure_lock(&self) -> Result<()> {
        self.step(6, "Configuring the wallpaper lock");
        if self.config.lock {
            dconf::apply_lock(&self.config, &self.layout, self.runner, self.report)
        } else {
            if !dconf::remove_lock(&self.layout, self.runner, self.report)? {
                self.report.line("Lock not requested, users may change the wallpaper.");
            }
            Ok(())
        }
    }
}
