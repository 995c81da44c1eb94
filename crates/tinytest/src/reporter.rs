//! TAP reporter - render results as TAP version 13

use crate::config::Diagnostics;
use crate::failure::AssertionFailure;
use crate::runner::{ExecutionResult, ResultList, TestRecord};
use std::io::{self, Write};

/// Indentation of the YAML diagnostic block
const INDENT: &str = "\t";

/// Exit code for a result list: the number of failed tests
pub fn exit_code(results: &ResultList) -> i32 {
    i32::try_from(results.failed()).unwrap_or(i32::MAX)
}

/// TAP-13 reporter
#[derive(Debug, Clone, Copy, Default)]
pub struct TapReporter {
    diagnostics: Diagnostics,
}

impl TapReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose how much each failure's YAML block contains
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Version and plan lines
    pub fn header(count: usize) -> [String; 2] {
        ["TAP version 13".to_string(), format!("1..{}", count)]
    }

    /// Lines for one result; `index` is 1-based
    pub fn result_lines(&self, index: usize, record: &TestRecord) -> Vec<String> {
        match &record.result {
            ExecutionResult::Passed => vec![format!("ok {} {}", index, record.name)],
            ExecutionResult::Skipped(skip) => {
                vec![format!("ok {} {} # SKIP {}", index, record.name, skip)]
            }
            ExecutionResult::Failed(failure) => {
                let mut lines = vec![format!("not ok {} {}", index, record.name)];
                lines.extend(self.diagnostic_block(failure));
                lines
            }
        }
    }

    fn diagnostic_block(&self, failure: &AssertionFailure) -> Vec<String> {
        let mut lines = vec![format!("{}---", INDENT)];

        if failure.message.contains('\n') {
            lines.push(format!("{}message: |", INDENT));
            lines.extend(
                failure
                    .message
                    .lines()
                    .map(|line| format!("{}  {}", INDENT, line)),
            );
        } else {
            lines.push(format!("{}message: {}", INDENT, failure.message));
        }

        if self.diagnostics == Diagnostics::Located {
            lines.push(format!("{}file: {}", INDENT, failure.file));
            lines.push(format!("{}line: {}", INDENT, failure.line));
        }

        lines.push(format!("{}...", INDENT));
        lines
    }

    /// Render the whole stream, newline-terminated
    pub fn render(&self, results: &ResultList) -> String {
        let mut out = String::new();
        for line in Self::header(results.len()) {
            out.push_str(&line);
            out.push('\n');
        }
        for (i, record) in results.iter().enumerate() {
            for line in self.result_lines(i + 1, record) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    }

    /// Write the stream to `out` and return the exit code
    pub fn report<W: Write>(&self, results: &ResultList, out: &mut W) -> io::Result<i32> {
        out.write_all(self.render(results).as_bytes())?;
        out.flush()?;
        Ok(exit_code(results))
    }
}
