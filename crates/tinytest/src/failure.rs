//! Outcome carriers - assertion failures and skips
//!
//! Tests signal anything other than a normal return by producing an
//! [`Interrupt`], which travels out of the test body through `?` and is
//! turned into an [`ExecutionResult`](crate::runner::ExecutionResult) by the
//! runner.

use crate::runner::UsageError;
use std::fmt;

/// Facts collected at the point where an assertion failed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facts {
    /// Source file of the failing assertion
    pub file: String,
    /// Line of the failing assertion
    pub line: u32,
    /// Stringified assertion expression, when known
    pub code: Option<String>,
    /// Author-supplied message
    pub message: Option<String>,
}

impl Facts {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
            code: None,
            message: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.message = (!message.is_empty()).then_some(message);
        self
    }
}

/// A failed assertion, always located
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionFailure {
    pub message: String,
    pub file: String,
    pub line: u32,
    pub code: Option<String>,
}

impl From<Facts> for AssertionFailure {
    fn from(facts: Facts) -> Self {
        let message = facts
            .message
            .unwrap_or_else(|| format!("Assertion Error in {}:{}", facts.file, facts.line));

        Self {
            message,
            file: facts.file,
            line: facts.line,
            code: facts.code,
        }
    }
}

/// `{}` prints the message; `{:#}` appends the location and expression.
impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if f.alternate() {
            write!(f, " at {}:{}", self.file, self.line)?;
            if let Some(code) = &self.code {
                write!(f, " ({})", code)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for AssertionFailure {}

/// A test that chose (or was chosen) not to run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Skip {
    pub reason: String,
}

impl Skip {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Reason used for `xtest_` methods that are never invoked
    pub fn by_convention(name: &str) -> Self {
        Self::new(format!("Test {} skipped by convention", name))
    }
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Non-local exit from a test body
#[derive(Debug)]
pub enum Interrupt {
    /// Recorded as a failed test
    Failed(AssertionFailure),
    /// Recorded as a skipped test
    Skipped(Skip),
    /// Defect in the suite itself; aborts the run
    Usage(UsageError),
}

impl From<AssertionFailure> for Interrupt {
    fn from(failure: AssertionFailure) -> Self {
        Interrupt::Failed(failure)
    }
}

impl From<Skip> for Interrupt {
    fn from(skip: Skip) -> Self {
        Interrupt::Skipped(skip)
    }
}

impl From<UsageError> for Interrupt {
    fn from(error: UsageError) -> Self {
        Interrupt::Usage(error)
    }
}

/// Return type of test bodies, `set_up` and `tear_down`
pub type Flow = Result<(), Interrupt>;
