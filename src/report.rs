//! Progress lines from the provisioning steps
//!
//! The steps only know about [`Report`]. The headless front-end prints lines,
//! the TUI receives them over a channel and appends them to its log view.

use std::sync::mpsc;

pub trait Report: Send + Sync {
    fn line(&self, msg: &str);

    /// Forward multi-line command output, skipping blanks
    fn block(&self, text: &str) {
        let text = text.trim();
        if !text.is_empty() {
            self.line(text);
        }
    }
}

/// Prints to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct Console;

impl Report for Console {
    fn line(&self, msg: &str) {
        tracing::info!("{}", msg);
        println!("{}", msg);
    }
}

/// Messages from the worker thread to the TUI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Line(String),
    Complete,
    Failed(String),
}

/// Sends lines to the TUI event loop
#[derive(Debug)]
pub struct ChannelReport {
    tx: mpsc::Sender<UiEvent>,
}

impl ChannelReport {
    pub fn new(tx: mpsc::Sender<UiEvent>) -> Self {
        Self { tx }
    }
}

impl Report for ChannelReport {
    fn line(&self, msg: &str) {
        tracing::info!("{}", msg);
        // Receiver gone means the UI quit; nothing left to show the line on
        let _ = self.tx.send(UiEvent::Line(msg.to_string()));
    }
}
