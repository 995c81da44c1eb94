//! Test runner - select and execute the tests of one case

use crate::case::{Context, Method, TestCase, TestFn};
use crate::discovery::{self, Candidates, TestKind};
use crate::failure::{AssertionFailure, Flow, Interrupt, Skip};
use crate::hook::AssertionHook;
use std::fmt;
use thiserror::Error;
use tracing::{debug, debug_span, info, trace, warn};

/// Defects in a suite; these abort the run instead of becoming results
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("No method {method} on {case}")]
    NoMethod { method: String, case: &'static str },

    #[error("Use `check(false, message)` instead of `fail(message)`")]
    FailDisabled,
}

/// Result of running a single test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Passed,
    Failed(AssertionFailure),
    Skipped(Skip),
}

impl ExecutionResult {
    /// Translate a lifecycle outcome; usage errors stay errors
    pub fn from_flow(flow: Flow) -> Result<Self, UsageError> {
        match flow {
            Ok(()) => Ok(ExecutionResult::Passed),
            Err(Interrupt::Failed(failure)) => Ok(ExecutionResult::Failed(failure)),
            Err(Interrupt::Skipped(skip)) => Ok(ExecutionResult::Skipped(skip)),
            Err(Interrupt::Usage(error)) => Err(error),
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, ExecutionResult::Passed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ExecutionResult::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ExecutionResult::Skipped(_))
    }

    fn label(&self) -> &'static str {
        match self {
            ExecutionResult::Passed => "passed",
            ExecutionResult::Failed(_) => "failed",
            ExecutionResult::Skipped(_) => "skipped",
        }
    }
}

/// A completed test: qualified name and result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRecord {
    /// `<Case>::<method>`
    pub name: String,
    pub result: ExecutionResult,
}

/// Results in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultList {
    records: Vec<TestRecord>,
}

impl ResultList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, result: ExecutionResult) {
        self.records.push(TestRecord {
            name: name.into(),
            result,
        });
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestRecord> {
        self.records.iter()
    }

    pub fn get(&self, index: usize) -> Option<&TestRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of failed tests
    pub fn failed(&self) -> usize {
        self.records.iter().filter(|r| r.result.is_failed()).count()
    }
}

impl<'a> IntoIterator for &'a ResultList {
    type Item = &'a TestRecord;
    type IntoIter = std::slice::Iter<'a, TestRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Lifecycle phases of a single test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Constructed,
    SetUp,
    Running,
    TornDown,
    Resolved,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Constructed => "constructed",
            Phase::SetUp => "set_up",
            Phase::Running => "running",
            Phase::TornDown => "torn_down",
            Phase::Resolved => "resolved",
        })
    }
}

/// What a method name resolves to when called
enum Target<C> {
    Invoke(TestFn<C>),
    Skip(Skip),
}

/// The declared methods of a case and the tests discovered among them
pub struct Suite<C> {
    methods: Vec<Method<C>>,
    candidates: Candidates,
}

impl<C: TestCase> Default for Suite<C> {
    fn default() -> Self {
        Self::discover()
    }
}

impl<C: TestCase> Suite<C> {
    /// Classify the declared methods of `C` once
    pub fn discover() -> Self {
        let methods = C::methods();
        let candidates = Candidates::discover(methods.iter().map(|m| m.name));
        debug!(case = C::name(), tests = candidates.len(), "discovered tests");

        Self {
            methods,
            candidates,
        }
    }

    /// Tests that could run, before focus selection
    pub fn candidates(&self) -> &Candidates {
        &self.candidates
    }

    /// Run the selected tests
    pub fn run_all(&self) -> Result<ResultList, UsageError> {
        self.run_filtered(None)
    }

    /// Run the selected tests whose names contain `pattern`
    ///
    /// The filter narrows the run set after focus selection.
    pub fn run_filtered(&self, pattern: Option<&str>) -> Result<ResultList, UsageError> {
        let selected = self.candidates.selected();
        let selected = match pattern {
            Some(pattern) => selected.filter(pattern),
            None => selected,
        };

        let mut results = ResultList::new();
        for test in selected.iter() {
            let name = format!("{}::{}", C::name(), test.name);
            let result = match test.kind {
                TestKind::Skipped => ExecutionResult::Skipped(Skip::by_convention(test.name)),
                TestKind::Normal | TestKind::Focused => self.run_one(test.name)?,
            };

            info!(test = %name, outcome = result.label(), "test finished");
            results.push(name, result);
        }

        Ok(results)
    }

    /// Run one test on a fresh instance
    ///
    /// `tear_down` runs once on every path once the instance exists. A
    /// failure or skip raised by `tear_down` only replaces a passing result.
    /// If construction itself panics there is no instance to tear down and
    /// the test fails.
    pub fn run_one(&self, name: &str) -> Result<ExecutionResult, UsageError> {
        let _span = debug_span!("run_one", case = C::name(), test = name).entered();
        let hook = AssertionHook::for_case::<C>();

        let mut case = match hook.capture(|| Ok(C::default())) {
            Ok(case) => case,
            Err(interrupt) => {
                warn!("construction failed, skipping set_up and tear_down");
                return ExecutionResult::from_flow(Err(interrupt));
            }
        };
        trace!(phase = %Phase::Constructed, "lifecycle");

        let mut ctx = Context::new(self, hook);
        let outcome = hook.capture(|| {
            trace!(phase = %Phase::SetUp, "lifecycle");
            case.set_up(&mut ctx)?;
            trace!(phase = %Phase::Running, "lifecycle");
            self.dispatch(&mut case, &mut ctx, name)
        });

        let teardown = hook.capture(|| case.tear_down(&mut ctx));
        trace!(phase = %Phase::TornDown, "lifecycle");

        let result = settle(outcome, teardown)?;
        trace!(phase = %Phase::Resolved, outcome = result.label(), "lifecycle");
        Ok(result)
    }

    /// Invoke the method `name` resolves to
    pub(crate) fn dispatch(&self, case: &mut C, ctx: &mut Context<'_, C>, name: &str) -> Flow {
        match self.resolve(name)? {
            Target::Invoke(body) => body(case, ctx),
            Target::Skip(skip) => Err(skip.into()),
        }
    }

    fn method(&self, name: &str) -> Option<&Method<C>> {
        self.methods.iter().find(|m| m.name == name)
    }

    fn resolve(&self, name: &str) -> Result<Target<C>, UsageError> {
        if let Some(method) = self.method(name) {
            return Ok(match self.candidates.find(name) {
                Some(test) if test.kind == TestKind::Skipped => {
                    Target::Skip(Skip::by_convention(name))
                }
                _ => Target::Invoke(method.body),
            });
        }

        if let Some((TestKind::Normal, base)) = discovery::split(name) {
            if self.method(&format!("x{}", base)).is_some() {
                debug!(test = name, "resolved to skipped sibling");
                return Ok(Target::Skip(Skip::new(name)));
            }

            if let Some(focused) = self.method(&format!("f{}", base)) {
                debug!(test = name, "resolved to focused sibling");
                return Ok(Target::Invoke(focused.body));
            }
        }

        Err(UsageError::NoMethod {
            method: name.to_string(),
            case: C::name(),
        })
    }
}

fn settle(outcome: Flow, teardown: Flow) -> Result<ExecutionResult, UsageError> {
    let result = ExecutionResult::from_flow(outcome)?;

    match teardown {
        Ok(()) => Ok(result),
        Err(Interrupt::Usage(error)) => Err(error),
        Err(interrupt) if result.is_passed() => ExecutionResult::from_flow(Err(interrupt)),
        Err(interrupt) => {
            warn!(?interrupt, "tear_down interrupted after {}", result.label());
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    thread_local! {
        static TEARDOWNS: Cell<usize> = const { Cell::new(0) };
        static BODY_RAN: Cell<bool> = const { Cell::new(false) };
    }

    fn reset() {
        TEARDOWNS.with(|c| c.set(0));
        BODY_RAN.with(|c| c.set(false));
    }

    fn teardowns() -> usize {
        TEARDOWNS.with(Cell::get)
    }

    fn body_ran() -> bool {
        BODY_RAN.with(Cell::get)
    }

    #[derive(Default)]
    struct C;

    impl C {
        fn test_pass(&mut self, ctx: &mut Context<Self>) -> Flow {
            ctx.check(true, "fine")
        }

        fn test_fail(&mut self, ctx: &mut Context<Self>) -> Flow {
            ctx.check(false, "boom")
        }

        fn test_skip(&mut self, ctx: &mut Context<Self>) -> Flow {
            ctx.skip("later")?;
            ctx.check(false, "never reached")
        }
    }

    impl TestCase for C {
        const SOURCE: &'static str = file!();

        fn methods() -> Vec<Method<Self>> {
            methods![test_pass, test_fail, test_skip]
        }

        fn tear_down(&mut self, _ctx: &mut Context<Self>) -> Flow {
            TEARDOWNS.with(|c| c.set(c.get() + 1));
            Ok(())
        }
    }

    #[test]
    fn test_run_all_scenario() {
        let results = Suite::<C>::discover().run_all().unwrap();

        let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["C::test_pass", "C::test_fail", "C::test_skip"]);

        assert!(results.get(0).unwrap().result.is_passed());
        match &results.get(1).unwrap().result {
            ExecutionResult::Failed(failure) => {
                assert_eq!(failure.message, "boom");
                assert!(failure.file.ends_with("runner.rs"));
                assert!(failure.line > 0);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(
            results.get(2).unwrap().result,
            ExecutionResult::Skipped(Skip::new("later"))
        );
        assert_eq!(results.failed(), 1);
    }

    #[test]
    fn test_tear_down_runs_once_per_outcome() {
        let suite = Suite::<C>::discover();
        for name in ["test_pass", "test_fail", "test_skip"] {
            reset();
            suite.run_one(name).unwrap();
            assert_eq!(teardowns(), 1, "tear_down count for {}", name);
        }
    }

    #[derive(Default)]
    struct Conventions;

    impl Conventions {
        fn xtest_base(&mut self, _ctx: &mut Context<Self>) -> Flow {
            BODY_RAN.with(|c| c.set(true));
            Ok(())
        }

        fn test_dependent(&mut self, ctx: &mut Context<Self>) -> Flow {
            ctx.delegate(self, "test_base")?;
            BODY_RAN.with(|c| c.set(true));
            ctx.check(false, "dependent should have been skipped")
        }

        fn ftest_target(&mut self, ctx: &mut Context<Self>) -> Flow {
            ctx.check(false, "focused target ran")
        }

        fn test_calls_focused(&mut self, ctx: &mut Context<Self>) -> Flow {
            ctx.delegate(self, "test_target")
        }

        fn test_calls_missing(&mut self, ctx: &mut Context<Self>) -> Flow {
            ctx.delegate(self, "test_nowhere")
        }

        fn test_uses_fail(&mut self, ctx: &mut Context<Self>) -> Flow {
            ctx.fail("please")
        }

        fn test_native_assert(&mut self, _ctx: &mut Context<Self>) -> Flow {
            assert_eq!(1 + 1, 2);
            assert!(false, "native boom");
            Ok(())
        }
    }

    impl TestCase for Conventions {
        const SOURCE: &'static str = file!();

        fn methods() -> Vec<Method<Self>> {
            methods![
                xtest_base,
                test_dependent,
                ftest_target,
                test_calls_focused,
                test_calls_missing,
                test_uses_fail,
                test_native_assert,
            ]
        }

        fn tear_down(&mut self, _ctx: &mut Context<Self>) -> Flow {
            TEARDOWNS.with(|c| c.set(c.get() + 1));
            Ok(())
        }
    }

    #[test]
    fn test_skipped_descriptor_is_never_executed() {
        reset();
        let result = Suite::<Conventions>::discover().run_one("xtest_base").unwrap();
        assert_eq!(
            result,
            ExecutionResult::Skipped(Skip::by_convention("xtest_base"))
        );
        assert!(!body_ran());
    }

    #[test]
    fn test_base_name_of_skipped_test_is_skipped() {
        reset();
        let result = Suite::<Conventions>::discover().run_one("test_base").unwrap();
        assert_eq!(result, ExecutionResult::Skipped(Skip::new("test_base")));
        assert!(!body_ran());
        assert_eq!(teardowns(), 1);
    }

    #[test]
    fn test_delegation_to_skipped_test_skips_caller() {
        reset();
        let result = Suite::<Conventions>::discover()
            .run_one("test_dependent")
            .unwrap();
        assert!(result.is_skipped());
        assert!(!body_ran());
    }

    #[test]
    fn test_delegation_to_focused_test_runs_it() {
        let result = Suite::<Conventions>::discover()
            .run_one("test_calls_focused")
            .unwrap();
        match result {
            ExecutionResult::Failed(failure) => assert_eq!(failure.message, "focused target ran"),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_delegation_to_missing_method_is_fatal() {
        reset();
        let error = Suite::<Conventions>::discover()
            .run_one("test_calls_missing")
            .unwrap_err();
        assert_eq!(
            error,
            UsageError::NoMethod {
                method: "test_nowhere".to_string(),
                case: "Conventions",
            }
        );
        assert_eq!(teardowns(), 1);
    }

    #[test]
    fn test_unknown_test_name_is_fatal() {
        let error = Suite::<Conventions>::discover()
            .run_one("helper_that_does_not_exist")
            .unwrap_err();
        assert_eq!(error.to_string(), "No method helper_that_does_not_exist on Conventions");
    }

    #[test]
    fn test_fail_helper_is_fatal() {
        let error = Suite::<Conventions>::discover()
            .run_one("test_uses_fail")
            .unwrap_err();
        assert_eq!(error, UsageError::FailDisabled);
    }

    #[test]
    fn test_native_assert_becomes_located_failure() {
        let result = Suite::<Conventions>::discover()
            .run_one("test_native_assert")
            .unwrap();
        match result {
            ExecutionResult::Failed(failure) => {
                assert_eq!(failure.message, "native boom");
                assert!(failure.file.ends_with("runner.rs"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_focus_restricts_run_set() {
        let results = Suite::<Conventions>::discover().run_all().unwrap();
        let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Conventions::ftest_target"]);
    }

    #[derive(Default)]
    struct Focused;

    impl Focused {
        fn ftest_a(&mut self, ctx: &mut Context<Self>) -> Flow {
            ctx.check(true, "")
        }

        fn test_b(&mut self, ctx: &mut Context<Self>) -> Flow {
            ctx.check(false, "should never run")
        }

        fn xtest_c(&mut self, _ctx: &mut Context<Self>) -> Flow {
            Ok(())
        }
    }

    impl TestCase for Focused {
        const SOURCE: &'static str = file!();

        fn methods() -> Vec<Method<Self>> {
            methods![ftest_a, test_b, xtest_c]
        }
    }

    #[test]
    fn test_focused_case_reports_only_focused() {
        let results = Suite::<Focused>::discover().run_all().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results.get(0).unwrap().name, "Focused::ftest_a");
        assert!(results.get(0).unwrap().result.is_passed());
    }

    #[test]
    fn test_filter_narrows_after_focus() {
        let suite = Suite::<C>::discover();
        let results = suite.run_filtered(Some("fail")).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results.get(0).unwrap().name, "C::test_fail");
    }

    #[derive(Default)]
    struct Lifecycle {
        prepared: bool,
    }

    impl Lifecycle {
        fn test_needs_set_up(&mut self, ctx: &mut Context<Self>) -> Flow {
            ctx.check(self.prepared, "set_up did not run")
        }

        fn test_pass(&mut self, _ctx: &mut Context<Self>) -> Flow {
            Ok(())
        }

        fn test_fail(&mut self, ctx: &mut Context<Self>) -> Flow {
            ctx.check(false, "body failed")
        }
    }

    impl TestCase for Lifecycle {
        const SOURCE: &'static str = file!();

        fn methods() -> Vec<Method<Self>> {
            methods![test_needs_set_up, test_pass, test_fail]
        }

        fn set_up(&mut self, _ctx: &mut Context<Self>) -> Flow {
            self.prepared = true;
            Ok(())
        }

        fn tear_down(&mut self, ctx: &mut Context<Self>) -> Flow {
            ctx.check(false, "tear_down failed")
        }
    }

    #[test]
    fn test_set_up_runs_before_body() {
        let result = Suite::<Lifecycle>::discover()
            .run_one("test_needs_set_up")
            .unwrap();
        // tear_down fails, so a passing body reports the teardown failure
        match result {
            ExecutionResult::Failed(failure) => assert_eq!(failure.message, "tear_down failed"),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_tear_down_failure_preserves_earlier_failure() {
        let result = Suite::<Lifecycle>::discover().run_one("test_fail").unwrap();
        match result {
            ExecutionResult::Failed(failure) => assert_eq!(failure.message, "body failed"),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[derive(Default)]
    struct BrokenSetUp;

    impl BrokenSetUp {
        fn test_never(&mut self, _ctx: &mut Context<Self>) -> Flow {
            BODY_RAN.with(|c| c.set(true));
            Ok(())
        }
    }

    impl TestCase for BrokenSetUp {
        const SOURCE: &'static str = file!();

        fn methods() -> Vec<Method<Self>> {
            methods![test_never]
        }

        fn set_up(&mut self, ctx: &mut Context<Self>) -> Flow {
            ctx.skip("fixture unavailable")
        }

        fn tear_down(&mut self, _ctx: &mut Context<Self>) -> Flow {
            TEARDOWNS.with(|c| c.set(c.get() + 1));
            Ok(())
        }
    }

    #[test]
    fn test_interrupted_set_up_still_tears_down() {
        reset();
        let result = Suite::<BrokenSetUp>::discover().run_one("test_never").unwrap();
        assert_eq!(
            result,
            ExecutionResult::Skipped(Skip::new("fixture unavailable"))
        );
        assert!(!body_ran());
        assert_eq!(teardowns(), 1);
    }

    struct Unconstructible;

    impl Default for Unconstructible {
        fn default() -> Self {
            panic!("no fixture")
        }
    }

    impl Unconstructible {
        fn test_any(&mut self, _ctx: &mut Context<Self>) -> Flow {
            Ok(())
        }
    }

    impl TestCase for Unconstructible {
        const SOURCE: &'static str = file!();

        fn methods() -> Vec<Method<Self>> {
            methods![test_any]
        }

        fn tear_down(&mut self, _ctx: &mut Context<Self>) -> Flow {
            TEARDOWNS.with(|c| c.set(c.get() + 1));
            Ok(())
        }
    }

    #[test]
    fn test_construction_panic_fails_without_tear_down() {
        reset();
        let result = Suite::<Unconstructible>::discover()
            .run_one("test_any")
            .unwrap();
        match result {
            ExecutionResult::Failed(failure) => assert_eq!(failure.message, "no fixture"),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(teardowns(), 0);
    }
}
