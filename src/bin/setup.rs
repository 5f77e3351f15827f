use anyhow::{bail, Result};
use std::env;
use tracing_subscriber::EnvFilter;

use weekwall::cmd;
use weekwall::config::Transport;
use weekwall::tui;

#[tokio::main]
async fn main() -> Result<()> {
    // Only log when asked to; the TUI owns the terminal
    if env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    let args: Vec<String> = env::args().collect();
    let transport = match args.get(1).map(|s| s.as_str()) {
        None => Transport::Nfs,
        Some("help" | "--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(arg) => match Transport::from_arg(arg) {
            Some(transport) => transport,
            None => {
                eprintln!("Unknown transport: {}", arg);
                print_usage();
                std::process::exit(1);
            }
        },
    };

    if !nix::unistd::geteuid().is_root() {
        bail!("weekwall-setup must be run as root (use sudo)");
    }

    cmd::preflight(cmd::REQUIRED_TOOLS)?;

    tui::run(transport).await
}

fn print_usage() {
    println!(
        r#"weekwall-setup - Weekly wallpaper from a network share

Usage:
    weekwall-setup [nfs|cifs]   Open the setup form (default: nfs)
    weekwall-setup help         Show this help message

The form installs a systemd mount unit, the weekly wallpaper script,
an autostart entry for all users and, optionally, a dconf lock.
Use weekwall-apply to run the same setup from a file.
"#
    );
}
