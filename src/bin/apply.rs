use anyhow::{bail, Context, Result};
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use weekwall::cmd::{self, SystemRunner};
use weekwall::config::{self, Share};
use weekwall::paths::Layout;
use weekwall::provision::Provisioner;
use weekwall::report::{Console, Report};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let Some(path) = args.get(1) else {
        bail!("weekwall-apply requires a setup file. Usage: weekwall-apply <setup.yaml|json|toml>");
    };

    if !nix::unistd::geteuid().is_root() {
        bail!("weekwall-apply must be run as root (use sudo)");
    }

    let mut config = config::load(Path::new(path))?;

    // Never required in the file
    if let Share::Cifs { password, .. } = &mut config.share {
        if password.trim().is_empty() {
            *password =
                rpassword::prompt_password("CIFS password: ").context("Failed to read password")?;
        }
    }

    let config = config.validate()?;
    cmd::preflight(cmd::REQUIRED_TOOLS)?;

    let report = Console;
    if let Err(e) = Provisioner::new(config, Layout::default(), &SystemRunner, &report).run() {
        report.line(&format!("ERROR: {:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
