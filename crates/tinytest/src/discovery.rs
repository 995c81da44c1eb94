//! Test discovery - classify declared methods by naming convention
//!
//! A declared method is a test when its name matches `^[xf]?test_`:
//!
//! | prefix   | kind                 |
//! |----------|----------------------|
//! | `test_`  | [`TestKind::Normal`]  |
//! | `xtest_` | [`TestKind::Skipped`] |
//! | `ftest_` | [`TestKind::Focused`] |

use std::fmt;

/// Marker every test name carries after its optional prefix
pub const MARKER: &str = "test_";

/// How a discovered test takes part in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestKind {
    Normal,
    Skipped,
    Focused,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TestKind::Normal => "normal",
            TestKind::Skipped => "skipped",
            TestKind::Focused => "focused",
        })
    }
}

/// Split a name into its kind and base name, if it is test-like
///
/// The base name is the name with any `x`/`f` prefix removed.
pub fn split(name: &str) -> Option<(TestKind, &str)> {
    let (kind, base) = match name.as_bytes().first() {
        Some(b'x') => (TestKind::Skipped, &name[1..]),
        Some(b'f') => (TestKind::Focused, &name[1..]),
        _ => (TestKind::Normal, name),
    };

    base.starts_with(MARKER).then_some((kind, base))
}

/// A discovered test method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestMethod {
    /// Declared name (e.g., "xtest_addition")
    pub name: &'static str,
    /// Kind derived from the prefix
    pub kind: TestKind,
}

impl TestMethod {
    /// Classify a declared name; `None` for non-test methods
    pub fn classify(name: &'static str) -> Option<Self> {
        split(name).map(|(kind, _)| Self { name, kind })
    }

    /// Name without the `x`/`f` prefix (e.g., "test_addition")
    pub fn base(&self) -> &'static str {
        match self.kind {
            TestKind::Normal => self.name,
            TestKind::Skipped | TestKind::Focused => &self.name[1..],
        }
    }
}

/// The tests that could run for one case, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    tests: Vec<TestMethod>,
}

impl Candidates {
    /// Discover tests among declared method names
    pub fn discover(names: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            tests: names.into_iter().filter_map(TestMethod::classify).collect(),
        }
    }

    /// Whether any test is focused
    pub fn has_focused(&self) -> bool {
        self.tests.iter().any(|t| t.kind == TestKind::Focused)
    }

    /// The run set: only the focused tests if there are any, otherwise all
    pub fn selected(&self) -> Self {
        if !self.has_focused() {
            return self.clone();
        }

        Self {
            tests: self
                .tests
                .iter()
                .filter(|t| t.kind == TestKind::Focused)
                .copied()
                .collect(),
        }
    }

    /// Filter tests by name pattern
    pub fn filter(&self, pattern: &str) -> Self {
        Self {
            tests: self
                .tests
                .iter()
                .filter(|t| t.name.contains(pattern))
                .copied()
                .collect(),
        }
    }

    /// Look up a test by its declared name
    pub fn find(&self, name: &str) -> Option<&TestMethod> {
        self.tests.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestMethod> {
        self.tests.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }
}
