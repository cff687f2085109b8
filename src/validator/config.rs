//! Validator configuration
//!
//! Everything the validator needs is passed in explicitly. The core reads no configuration files and no environment
//! variables; the CLI maps its flags onto this struct.

use std::path::PathBuf;
use std::time::Duration;

use coursecheck_core::conventions;

/// Resource limits applied to every interpreter process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxLimits {
    /// CPU seconds before the kernel stops the interpreter (`RLIMIT_CPU`)
    pub cpu_seconds: Option<u64>,
    /// Address-space ceiling in bytes (`RLIMIT_AS`)
    pub memory_bytes: Option<u64>,
    /// Whether snippets may open internet sockets
    pub allow_network: bool,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            cpu_seconds: Some(10),
            memory_bytes: Some(512 * 1024 * 1024),
            allow_network: false,
        }
    }
}

impl SandboxLimits {
    /// No rlimits and network allowed. Only the wall-clock timeouts still apply.
    pub fn unrestricted() -> Self {
        Self {
            cpu_seconds: None,
            memory_bytes: None,
            allow_network: true,
        }
    }
}

/// Validator configuration
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Interpreter executable (looked up on `PATH` when not absolute)
    pub interpreter: PathBuf,
    /// Value returned by the stubbed `input()`
    pub input_sentinel: String,
    /// File the code under test is written to
    pub code_file_name: String,
    /// Module name test scripts import the code under test by
    pub code_module_name: String,
    /// File the test script is written to
    pub test_file_name: String,
    /// Wall-clock bound for the syntax and symbol probes
    pub probe_timeout: Duration,
    /// Wall-clock bound for the executability check
    pub execution_timeout: Duration,
    /// Wall-clock bound for the unittest run
    pub test_timeout: Duration,
    pub limits: SandboxLimits,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from(conventions::DEFAULT_INTERPRETER),
            input_sentinel: conventions::INPUT_SENTINEL.to_string(),
            code_file_name: conventions::CODE_FILE_NAME.to_string(),
            code_module_name: conventions::CODE_MODULE_NAME.to_string(),
            test_file_name: conventions::TEST_FILE_NAME.to_string(),
            probe_timeout: Duration::from_secs(10),
            execution_timeout: Duration::from_secs(10),
            test_timeout: Duration::from_secs(60),
            limits: SandboxLimits::default(),
        }
    }
}

impl ValidatorConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interpreter executable
    pub fn with_interpreter(mut self, interpreter: impl Into<PathBuf>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Set the value returned by the stubbed `input()`
    pub fn with_input_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.input_sentinel = sentinel.into();
        self
    }

    /// Set the executability timeout
    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = timeout;
        self
    }

    /// Set the unittest run timeout
    pub fn with_test_timeout(mut self, timeout: Duration) -> Self {
        self.test_timeout = timeout;
        self
    }

    /// Set the probe timeout
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Set the sandbox limits
    pub fn with_limits(mut self, limits: SandboxLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Interpreter as a display string (for messages and logs)
    pub fn interpreter_display(&self) -> String {
        self.interpreter.to_string_lossy().to_string()
    }
}
