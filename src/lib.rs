pub mod autostart;
pub mod cmd;
pub mod config;
pub mod dconf;
pub mod desktop;
pub mod form;
pub mod mount;
pub mod paths;
pub mod provision;
pub mod report;
pub mod script;
pub mod tui;

#[cfg(test)]
pub(crate) mod testing;
