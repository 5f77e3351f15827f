//! Fakes shared by the unit tests

use anyhow::Result;
use std::sync::Mutex;

use crate::cmd::{CommandRunner, Output};
use crate::report::Report;

/// Records every command and answers from a list of canned failures.
/// Anything not listed succeeds with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    calls: Mutex<Vec<String>>,
    failures: Vec<(String, Output)>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail commands whose `program args...` line starts with `prefix`
    pub fn fail_when(mut self, prefix: &str, code: i32, stderr: &str) -> Self {
        self.failures.push((
            prefix.to_string(),
            Output {
                code: Some(code),
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        ));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn output(&self, program: &str, args: &[String]) -> Result<Output> {
        let line = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().unwrap().push(line.clone());

        let canned = self
            .failures
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, out)| out.clone());

        Ok(canned.unwrap_or(Output {
            code: Some(0),
            ..Default::default()
        }))
    }
}

#[derive(Default)]
pub struct MemoryReport {
    lines: Mutex<Vec<String>>,
}

impl MemoryReport {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

impl Report for MemoryReport {
    fn line(&self, msg: &str) {
        self.lines.lock().unwrap().push(msg.to_string());
    }
}
