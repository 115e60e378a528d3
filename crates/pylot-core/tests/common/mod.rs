//! Shared scripted transport for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;

use pylot_core::transport::{ExecError, Transport};

/// Records every issued command and answers `capture` calls from canned
/// responses matched by substring.
#[derive(Default)]
pub struct FakeTransport {
    responses: Vec<(String, String)>,
    runs: RefCell<Vec<String>>,
    sudos: RefCell<Vec<String>>,
    captures: RefCell<Vec<String>>,
    puts: RefCell<Vec<(String, String)>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to any captured command containing `needle` with `output`.
    /// Earlier registrations win.
    pub fn respond(mut self, needle: &str, output: &str) -> Self {
        self.responses.push((needle.to_string(), output.to_string()));
        self
    }

    pub fn run_log(&self) -> Vec<String> {
        self.runs.borrow().clone()
    }

    pub fn sudo_log(&self) -> Vec<String> {
        self.sudos.borrow().clone()
    }

    pub fn capture_log(&self) -> Vec<String> {
        self.captures.borrow().clone()
    }

    pub fn put_log(&self) -> Vec<(String, String)> {
        self.puts.borrow().clone()
    }
}

impl Transport for FakeTransport {
    fn target(&self) -> String {
        "fake".to_string()
    }

    fn run(&self, command: &str) -> Result<(), ExecError> {
        self.runs.borrow_mut().push(command.to_string());
        Ok(())
    }

    fn sudo(&self, command: &str) -> Result<(), ExecError> {
        self.sudos.borrow_mut().push(command.to_string());
        Ok(())
    }

    fn capture(&self, command: &str) -> Result<String, ExecError> {
        self.captures.borrow_mut().push(command.to_string());
        for (needle, output) in &self.responses {
            if command.contains(needle.as_str()) {
                return Ok(output.clone());
            }
        }
        Err(ExecError::CommandFailed {
            command: command.to_string(),
            status: 1,
            stderr: "no scripted response".to_string(),
        })
    }

    fn put(&self, content: &str, path: &str) -> Result<(), ExecError> {
        self.puts
            .borrow_mut()
            .push((content.to_string(), path.to_string()));
        Ok(())
    }
}
