//! tinytest - convention-driven unit tests reported as TAP
//!
//! A test case is a type implementing [`TestCase`]. Its methods are picked up
//! by name:
//! - `test_*` runs normally
//! - `xtest_*` is skipped without running
//! - `ftest_*` is focused: if any test is focused, only focused tests run
//!
//! Each test runs on a fresh instance between `set_up` and `tear_down`.
//! Failed checks, native `assert!` panics and skips become results; the
//! results are printed as TAP version 13 and the process exits with the
//! number of failed tests.
//!
//! # Example
//!
//! ```no_run
//! use tinytest::{check, methods, Context, Flow, Method, TestCase};
//!
//! #[derive(Default)]
//! struct ArithmeticTest {
//!     base: i32,
//! }
//!
//! impl ArithmeticTest {
//!     fn test_add(&mut self, ctx: &mut Context<Self>) -> Flow {
//!         check!(ctx, self.base + 2 == 12, "base should be ten")
//!     }
//!
//!     fn test_calls_skipped(&mut self, ctx: &mut Context<Self>) -> Flow {
//!         // Skipped too, because `test_divide` was renamed to `xtest_divide`
//!         ctx.delegate(self, "test_divide")
//!     }
//!
//!     fn xtest_divide(&mut self, _ctx: &mut Context<Self>) -> Flow {
//!         Ok(())
//!     }
//! }
//!
//! impl TestCase for ArithmeticTest {
//!     const SOURCE: &'static str = file!();
//!
//!     fn methods() -> Vec<Method<Self>> {
//!         methods![test_add, test_calls_skipped, xtest_divide]
//!     }
//!
//!     fn set_up(&mut self, _ctx: &mut Context<Self>) -> Flow {
//!         self.base = 10;
//!         Ok(())
//!     }
//! }
//!
//! fn main() {
//!     tinytest::run!(ArithmeticTest);
//! }
//! ```

pub mod case;
pub mod config;
pub mod discovery;
pub mod entry;
pub mod failure;
pub mod fakes;
pub mod hook;
pub mod logging;
pub mod reporter;
pub mod runner;

pub use case::{Context, Method, TestCase, TestFn};
pub use config::{Config, ConfigError, ConfigResult, Diagnostics};
pub use discovery::{Candidates, TestKind, TestMethod};
pub use entry::{
    execute, is_entry_point, process_exit_code, run, RunError, FATAL_EXIT, MAX_FAILURE_EXIT,
};
pub use failure::{AssertionFailure, Facts, Flow, Interrupt, Skip};
pub use fakes::{identity, noop, Double, Member, Spy, Stub};
pub use hook::AssertionHook;
pub use reporter::{exit_code, TapReporter};
pub use runner::{ExecutionResult, Phase, ResultList, Suite, TestRecord, UsageError};
