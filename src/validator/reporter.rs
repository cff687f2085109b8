//! Progress reporting
//!
//! ## ProgressReporter Trait
//!
//! The validator never prints directly. Every stage transition goes through a `ProgressReporter`, so a host (CLI,
//! UI, test) decides where messages end up. Any `FnMut(&str)` closure is a reporter.
//!
//! Reporting is assumed infallible: if a sink panics, the panic propagates out of the check that emitted the
//! message.

/// Sink for progress messages.
pub trait ProgressReporter {
    /// Deliver one message. Called in pipeline order, once per stage transition.
    fn send_message(&mut self, message: &str);
}

impl<F> ProgressReporter for F
where
    F: FnMut(&str),
{
    fn send_message(&mut self, message: &str) {
        self(message)
    }
}

/// Default reporter: one line per message on standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn send_message(&mut self, message: &str) {
        println!("{}", message);
    }
}

/// Reporter that keeps every message in memory.
#[derive(Debug, Default, Clone)]
pub struct CollectingReporter {
    pub messages: Vec<String>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages reporting a failed check.
    pub fn failures(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .map(String::as_str)
            .filter(|m| coursecheck_core::messages::is_failure(m))
    }

    /// Drain the collected messages.
    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }
}

impl ProgressReporter for CollectingReporter {
    fn send_message(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}
