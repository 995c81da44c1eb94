//! Entry point - run a case when its file is the program being executed
//!
//! A suite file can be both a module other suites pull in and a standalone
//! binary. [`run!`](crate::run!) only runs the case when the file declaring
//! it is the file the binary's `main` lives in.

use crate::case::TestCase;
use crate::config::{Config, ConfigError};
use crate::logging;
use crate::reporter::TapReporter;
use crate::runner::{Suite, UsageError};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::{env, fs, process};
use thiserror::Error;
use tracing::{debug, error};

/// Exit code for runs aborted by a usage or configuration error
pub const FATAL_EXIT: i32 = 255;

/// Highest exit code a run with failures reports; stays clear of 0 and [`FATAL_EXIT`]
pub const MAX_FAILURE_EXIT: i32 = 254;

/// Process exit code for `failed` failures, clamped so it cannot wrap to 0
pub fn process_exit_code(failed: i32) -> i32 {
    failed.clamp(0, MAX_FAILURE_EXIT)
}

/// Errors that abort a run before a result list is reported
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to write TAP output: {0}")]
    Io(#[from] io::Error),
}

/// Whether `source` and `entry` name the same file
///
/// Compares canonical paths; when either cannot be canonicalised (for
/// instance `file!()` paths seen from another working directory) the
/// lexically normalised paths are compared instead.
pub fn is_entry_point(source: &str, entry: &str) -> bool {
    let (source, entry) = (Path::new(source), Path::new(entry));

    match (fs::canonicalize(source), fs::canonicalize(entry)) {
        (Ok(source), Ok(entry)) => source == entry,
        _ => normalize(source) == normalize(entry),
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Run every selected test of `C`, write TAP to `out`, return the exit code
pub fn execute<C: TestCase, W: Write>(config: &Config, out: &mut W) -> Result<i32, RunError> {
    let results = Suite::<C>::discover().run_filtered(config.filter.as_deref())?;
    let code = TapReporter::new()
        .with_diagnostics(config.diagnostics)
        .report(&results, out)?;
    Ok(code)
}

/// Run `C` and exit the process if `entry` is the file declaring `C`
///
/// Returns without doing anything otherwise. Prefer the [`run!`](crate::run!)
/// macro, which passes the calling file.
pub fn run<C: TestCase>(entry: &str) {
    if !is_entry_point(C::SOURCE, entry) {
        debug!(case = C::name(), source = C::SOURCE, entry, "not the entry point");
        return;
    }

    logging::init();

    let start_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let outcome = Config::load(&start_dir)
        .map_err(RunError::from)
        .and_then(|config| execute::<C, _>(&config, &mut io::stdout().lock()));

    let code = match outcome {
        Ok(code) => process_exit_code(code),
        Err(e) => {
            error!(case = C::name(), "run aborted: {}", e);
            eprintln!("{}: {}", C::name(), e);
            FATAL_EXIT
        }
    };

    process::exit(code);
}

/// Run a case from the `main` of the file that declares it
///
/// ```no_run
/// # use tinytest::{methods, Context, Flow, Method, TestCase};
/// # #[derive(Default)]
/// # struct SomeTest;
/// # impl SomeTest {
/// #     fn test_should_fail(&mut self, ctx: &mut Context<Self>) -> Flow {
/// #         ctx.check(false, "This test should fail to prove it ran")
/// #     }
/// # }
/// # impl TestCase for SomeTest {
/// #     const SOURCE: &'static str = file!();
/// #     fn methods() -> Vec<Method<Self>> { methods![test_should_fail] }
/// # }
/// fn main() {
///     tinytest::run!(SomeTest);
/// }
/// ```
#[macro_export]
macro_rules! run {
    ($case:ty) => {
        $crate::run::<$case>(file!())
    };
}
