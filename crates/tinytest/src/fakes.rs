//! Test doubles - stand-ins configured with canned data and methods
//!
//! A [`Stub`] is a set of named members, each either a value or a callable.
//! A [`Spy`] is a stub that also remembers every call made through it.
//! Both implement [`Double`], so fixtures can be written once for either.

use std::collections::HashMap;
use std::fmt;

/// Callable member of a double
pub type Callable<V> = Box<dyn Fn(&[V]) -> Option<V>>;

/// A named member of a double
pub enum Member<V> {
    Value(V),
    Method(Callable<V>),
}

impl<V: 'static> Member<V> {
    pub fn method(f: impl Fn(&[V]) -> Option<V> + 'static) -> Self {
        Member::Method(Box::new(f))
    }
}

impl<V: fmt::Debug> fmt::Debug for Member<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Member::Method(_) => f.write_str("Method(..)"),
        }
    }
}

/// A method that does nothing
pub fn noop<V: 'static>() -> Member<V> {
    Member::method(|_| None)
}

/// A method returning its first argument
pub fn identity<V: Clone + 'static>() -> Member<V> {
    Member::method(|args: &[V]| args.first().cloned())
}

/// Behaviour shared by stubs and spies
pub trait Double<V> {
    /// Member by name; `None` when unset
    fn member(&self, name: &str) -> Option<&Member<V>>;

    /// Set or replace a member
    fn set(&mut self, name: &str, member: Member<V>);

    /// Call through to a callable member
    ///
    /// `None` when the member is unset, is a plain value, or returns nothing.
    fn call(&mut self, name: &str, args: &[V]) -> Option<V>;

    /// Value member by name; `None` when unset or callable
    fn get(&self, name: &str) -> Option<&V> {
        match self.member(name)? {
            Member::Value(value) => Some(value),
            Member::Method(_) => None,
        }
    }

    fn is_callable(&self, name: &str) -> bool {
        matches!(self.member(name), Some(Member::Method(_)))
    }
}

/// A configured stand-in object
#[derive(Debug)]
pub struct Stub<V> {
    members: HashMap<String, Member<V>>,
}

impl<V> Default for Stub<V> {
    fn default() -> Self {
        Self {
            members: HashMap::new(),
        }
    }
}

impl<V> Stub<V> {
    pub fn new<N: Into<String>>(members: impl IntoIterator<Item = (N, Member<V>)>) -> Self {
        Self {
            members: members
                .into_iter()
                .map(|(name, member)| (name.into(), member))
                .collect(),
        }
    }
}

impl<V> Double<V> for Stub<V> {
    fn member(&self, name: &str) -> Option<&Member<V>> {
        self.members.get(name)
    }

    fn set(&mut self, name: &str, member: Member<V>) {
        self.members.insert(name.to_string(), member);
    }

    fn call(&mut self, name: &str, args: &[V]) -> Option<V> {
        match self.members.get(name)? {
            Member::Method(f) => f(args),
            Member::Value(_) => None,
        }
    }
}

/// A stub that records the calls made through it
#[derive(Debug)]
pub struct Spy<V> {
    stub: Stub<V>,
    calls: HashMap<String, Vec<Vec<V>>>,
}

impl<V> Default for Spy<V> {
    fn default() -> Self {
        Self {
            stub: Stub::default(),
            calls: HashMap::new(),
        }
    }
}

impl<V: Clone> Spy<V> {
    pub fn new<N: Into<String>>(members: impl IntoIterator<Item = (N, Member<V>)>) -> Self {
        Self {
            stub: Stub::new(members),
            calls: HashMap::new(),
        }
    }

    /// Number of calls recorded for `name` so far
    pub fn got(&self, name: &str) -> usize {
        self.calls.get(name).map_or(0, Vec::len)
    }

    /// Arguments of each recorded call to `name`
    pub fn calls(&self, name: &str) -> &[Vec<V>] {
        self.calls
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl<V: Clone> Double<V> for Spy<V> {
    fn member(&self, name: &str) -> Option<&Member<V>> {
        self.stub.member(name)
    }

    fn set(&mut self, name: &str, member: Member<V>) {
        self.stub.set(name, member);
    }

    /// Record the call, then call through
    fn call(&mut self, name: &str, args: &[V]) -> Option<V> {
        self.calls
            .entry(name.to_string())
            .or_default()
            .push(args.to_vec());
        self.stub.call(name, args)
    }
}
