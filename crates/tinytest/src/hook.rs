//! Assertion hook - bridge native assertions into [`AssertionFailure`]
//!
//! Two layers cooperate here:
//!
//! - a process-wide panic hook, installed once by [`install`], which records
//!   the location and message of a panic raised inside a capture scope
//!   instead of printing it;
//! - an [`AssertionHook`] value owned by a single test lifecycle, which opens
//!   capture scopes and raises typed failures for the suite that owns it.
//!
//! The panic hook is process-wide state. Captured facts are kept per thread
//! and per capture scope, so a panic on one thread is never attributed to a
//! run on another. A panic outside any capture scope goes to whatever hook
//! was installed before ours.

use crate::case::TestCase;
use crate::failure::{AssertionFailure, Facts, Interrupt};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use tracing::debug;

const UNKNOWN_FILE: &str = "<unknown>";

/// Prefix of the message `assert!` generates when given no message
const ASSERTION_PREFIX: &str = "assertion failed: ";

static INSTALL: Once = Once::new();

/// Facts recorded by the panic hook, with the raw payload text they came from
struct Recorded {
    payload: Option<String>,
    facts: Facts,
}

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static LAST_PANIC: RefCell<Option<Recorded>> = const { RefCell::new(None) };
}

/// Install the panic bridge. Idempotent.
pub fn install() {
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !CAPTURING.with(Cell::get) {
                previous(info);
                return;
            }

            let facts = match info.location() {
                Some(location) => Facts::new(location.file(), location.line()),
                None => Facts::new(UNKNOWN_FILE, 0),
            };
            let payload = payload_message(info.payload());
            let facts = with_payload(facts, payload.clone());

            LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(Recorded { payload, facts }));
        }));
    });
}

fn payload_message(payload: &(dyn Any + Send)) -> Option<String> {
    if let Some(message) = payload.downcast_ref::<&str>() {
        Some((*message).to_string())
    } else {
        payload.downcast_ref::<String>().cloned()
    }
}

/// Attach a panic message to `facts`
///
/// A bare `assert!(expr)` carries only the expression, which becomes the
/// code so the failure gets the default message.
fn with_payload(facts: Facts, payload: Option<String>) -> Facts {
    match payload {
        Some(message) => match message.strip_prefix(ASSERTION_PREFIX) {
            Some(code) => facts.with_code(code),
            None => facts.with_message(message),
        },
        None => facts,
    }
}

/// Run `f`, turning a panic into [`Interrupt::Failed`]
fn capture<R>(f: impl FnOnce() -> Result<R, Interrupt>) -> Result<R, Interrupt> {
    install();

    LAST_PANIC.with(|slot| slot.borrow_mut().take());
    let was_capturing = CAPTURING.with(|flag| flag.replace(true));
    let outcome = panic::catch_unwind(AssertUnwindSafe(f));
    CAPTURING.with(|flag| flag.set(was_capturing));

    match outcome {
        Ok(result) => result,
        Err(payload) => {
            let message = payload_message(payload.as_ref());
            // resume_unwind bypasses the hook, so the recording may belong to
            // a panic the body already caught
            let facts = match LAST_PANIC.with(|slot| slot.borrow_mut().take()) {
                Some(recorded) if recorded.payload == message => recorded.facts,
                _ => with_payload(Facts::new(UNKNOWN_FILE, 0), message),
            };
            Err(Interrupt::Failed(facts.into()))
        }
    }
}

/// Assertion hook scoped to one test lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssertionHook {
    owner: &'static str,
}

impl AssertionHook {
    /// Create the hook for a run of `C`, making sure the panic bridge is live
    pub fn for_case<C: TestCase>() -> Self {
        install();
        Self { owner: C::name() }
    }

    /// Name of the suite this hook reports for
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    /// Build the failure for `facts` and wrap it as an interrupt
    pub fn raise(&self, facts: Facts) -> Interrupt {
        let failure = AssertionFailure::from(facts);
        debug!(
            case = self.owner,
            file = %failure.file,
            line = failure.line,
            message = %failure.message,
            "assertion failed"
        );
        Interrupt::Failed(failure)
    }

    /// Run `f` inside a capture scope
    pub fn capture<R>(&self, f: impl FnOnce() -> Result<R, Interrupt>) -> Result<R, Interrupt> {
        capture(f).inspect_err(|interrupt| {
            if let Interrupt::Failed(failure) = interrupt {
                debug!(case = self.owner, "captured: {:#}", failure);
            }
        })
    }
}
