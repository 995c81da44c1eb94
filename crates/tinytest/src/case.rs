//! Test case declaration - the `TestCase` trait and the per-run `Context`

use crate::failure::{Facts, Flow, Skip};
use crate::hook::AssertionHook;
use crate::runner::{Suite, UsageError};
use std::fmt;
use std::panic::Location;

/// Signature shared by test methods
pub type TestFn<C> = fn(&mut C, &mut Context<'_, C>) -> Flow;

/// A declared method: its name and body
pub struct Method<C> {
    pub name: &'static str,
    pub body: TestFn<C>,
}

impl<C> Method<C> {
    pub fn new(name: &'static str, body: TestFn<C>) -> Self {
        Self { name, body }
    }
}

impl<C> Clone for Method<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Method<C> {}

impl<C> fmt::Debug for Method<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method").field("name", &self.name).finish()
    }
}

/// A test class
///
/// Every test runs on a fresh `Default` instance.
///
/// # Example
///
/// ```
/// use tinytest::{methods, Context, Flow, Method, TestCase};
///
/// #[derive(Default)]
/// struct MathTest;
///
/// impl MathTest {
///     fn test_add(&mut self, ctx: &mut Context<Self>) -> Flow {
///         ctx.check(1 + 1 == 2, "addition works")
///     }
///
///     fn xtest_divide(&mut self, _ctx: &mut Context<Self>) -> Flow {
///         unreachable!("skipped by convention")
///     }
/// }
///
/// impl TestCase for MathTest {
///     const SOURCE: &'static str = file!();
///
///     fn methods() -> Vec<Method<Self>> {
///         methods![test_add, xtest_divide]
///     }
/// }
/// ```
pub trait TestCase: Default + Sized + 'static {
    /// Source file declaring the case; compared against the entry point by `run!`
    const SOURCE: &'static str;

    /// Name used to qualify test names in reports
    fn name() -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Declared methods in declaration order
    fn methods() -> Vec<Method<Self>>;

    /// Run before every test
    fn set_up(&mut self, _ctx: &mut Context<'_, Self>) -> Flow {
        Ok(())
    }

    /// Run after every test
    fn tear_down(&mut self, _ctx: &mut Context<'_, Self>) -> Flow {
        Ok(())
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

/// Declare the methods of a [`TestCase`] in order
#[macro_export]
macro_rules! methods {
    ($($method:ident),* $(,)?) => {
        vec![$($crate::Method::new(stringify!($method), Self::$method)),*]
    };
}

/// Assert through a [`Context`], recording the expression text
///
/// Evaluates to a [`Flow`](crate::Flow); propagate it with `?`.
#[macro_export]
macro_rules! check {
    ($ctx:expr, $cond:expr $(,)?) => {
        $ctx.check_facts(
            $cond,
            $crate::Facts::new(file!(), line!()).with_code(stringify!($cond)),
        )
    };
    ($ctx:expr, $cond:expr, $($arg:tt)+) => {
        $ctx.check_facts(
            $cond,
            $crate::Facts::new(file!(), line!())
                .with_code(stringify!($cond))
                .with_message(format!($($arg)+)),
        )
    };
}

/// Per-run context handed to `set_up`, test bodies and `tear_down`
pub struct Context<'s, C> {
    suite: &'s Suite<C>,
    hook: AssertionHook,
}

impl<'s, C: TestCase> Context<'s, C> {
    pub(crate) fn new(suite: &'s Suite<C>, hook: AssertionHook) -> Self {
        Self { suite, hook }
    }

    /// The assertion hook of this run
    pub fn hook(&self) -> AssertionHook {
        self.hook
    }

    /// Fail the test at the caller's location unless `condition` holds
    ///
    /// An empty message falls back to `Assertion Error in <file>:<line>`.
    #[track_caller]
    pub fn check(&self, condition: bool, message: impl Into<String>) -> Flow {
        if condition {
            return Ok(());
        }

        let caller = Location::caller();
        Err(self
            .hook
            .raise(Facts::new(caller.file(), caller.line()).with_message(message)))
    }

    /// Fail the test with pre-collected facts unless `condition` holds
    pub fn check_facts(&self, condition: bool, facts: Facts) -> Flow {
        if condition {
            Ok(())
        } else {
            Err(self.hook.raise(facts))
        }
    }

    /// Skip the current test; best placed at the top of the body
    pub fn skip(&self, reason: impl Into<String>) -> Flow {
        Err(Skip::new(reason).into())
    }

    /// Always a usage error: use [`Context::check`] with a message instead
    pub fn fail(&self, _reason: impl Into<String>) -> Flow {
        Err(UsageError::FailDisabled.into())
    }

    /// Call another method of the case by name
    ///
    /// A base name resolves to its `x`-prefixed sibling (skipping the
    /// caller) or its `f`-prefixed sibling (running it), so renaming a test
    /// to skip or focus it does not break the tests that call it.
    pub fn delegate(&mut self, case: &mut C, name: &str) -> Flow {
        let suite = self.suite;
        suite.dispatch(case, self, name)
    }
}
