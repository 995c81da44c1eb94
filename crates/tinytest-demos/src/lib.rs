//! Fixtures shared between the demo suites
//!
//! Each binary under `src/bin` is a suite that runs itself when executed.

pub mod logger {
    use tinytest::{noop, Context, Double, Flow, Member, TestCase};

    /// Methods a PSR-3 style logger exposes
    pub const LOGGER_METHODS: [&str; 9] = [
        "emergency",
        "alert",
        "critical",
        "error",
        "warning",
        "notice",
        "info",
        "debug",
        "log",
    ];

    /// One do-nothing member per logger method
    pub fn logger_members<V: 'static>() -> Vec<(&'static str, Member<V>)> {
        LOGGER_METHODS.iter().map(|&name| (name, noop())).collect()
    }

    /// Every logger method is callable and returns nothing
    pub fn check_logger<V, D, C>(logger: &mut D, ctx: &Context<C>) -> Flow
    where
        D: Double<V>,
        C: TestCase,
    {
        for name in LOGGER_METHODS {
            ctx.check(logger.is_callable(name), format!("{} should be callable...", name))?;
            ctx.check(
                logger.call(name, &[]).is_none(),
                format!("logger::{} should return nothing", name),
            )?;
        }
        Ok(())
    }
}
