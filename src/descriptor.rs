use crate::any_value::Value;
use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

/// Structural constraints a value may satisfy independently of its concrete type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// An ordered sequence whose elements can be read by index
    List,
    /// Indexing into the sequence takes constant time
    RandomAccess,
    /// Callable with exactly one argument
    Consumer,
}

impl Capability {
    pub fn name(self) -> &'static str {
        match self {
            Capability::List => "List",
            Capability::RandomAccess => "RandomAccess",
            Capability::Consumer => "Consumer",
        }
    }

    /// Whether `value` has this capability
    ///
    /// Answered from the value's own [`List`](crate::List) or
    /// [`Consumer`](crate::Consumer) view, the same view a key hands back
    /// after a successful check.
    pub fn satisfied_by(self, value: &Rc<dyn Value>) -> bool {
        match self {
            Capability::List => Rc::clone(value).into_list().is_some(),
            Capability::RandomAccess => Rc::clone(value)
                .into_list()
                .map_or(false, |list| list.is_random_access()),
            Capability::Consumer => Rc::clone(value).into_consumer().is_some(),
        }
    }
}

/// Whether a descriptor names an exact type or a structural capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    /// Satisfied only by values of one exact runtime type
    Concrete,
    /// Satisfied by any value reporting the capability
    Structural,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Test {
    Exact(TypeId),
    Capability(Capability),
}

/// A runtime handle identifying a type or a structural capability
///
/// Concrete descriptors compare a value's [`TypeId`]. Structural descriptors
/// ask for the value's list or consumer view, so any number of unrelated
/// types can satisfy them.
///
/// # Examples
///
/// ```
/// use sovran_keymap::{Capability, TypeDescriptor, Value};
/// use std::rc::Rc;
///
/// let doubles = TypeDescriptor::of::<f64>();
/// let random_access = TypeDescriptor::capability(Capability::RandomAccess);
///
/// let value: Rc<dyn Value> = Rc::new(vec![1.0f32, 2.0]);
/// assert!(!doubles.matches(&value));
/// assert!(random_access.matches(&value));
/// assert_eq!(doubles.to_string(), "f64");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    name: &'static str,
    test: Test,
}

impl TypeDescriptor {
    /// Descriptor satisfied only by values of type `T`
    pub fn of<T: Any>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            test: Test::Exact(TypeId::of::<T>()),
        }
    }

    /// Descriptor satisfied by any value reporting `capability`
    pub fn capability(capability: Capability) -> Self {
        Self {
            name: capability.name(),
            test: Test::Capability(capability),
        }
    }

    pub fn kind(&self) -> DescriptorKind {
        match self.test {
            Test::Exact(_) => DescriptorKind::Concrete,
            Test::Capability(_) => DescriptorKind::Structural,
        }
    }

    pub fn is_structural(&self) -> bool {
        self.kind() == DescriptorKind::Structural
    }

    /// Fully qualified name for concrete descriptors, capability name otherwise
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Tests whether `value` satisfies this descriptor
    pub fn matches(&self, value: &Rc<dyn Value>) -> bool {
        match self.test {
            Test::Exact(type_id) => (**value).as_any().type_id() == type_id,
            Test::Capability(capability) => capability.satisfied_by(value),
        }
    }

    /// The clause used in mismatch messages, e.g. "extend type f64"
    pub(crate) fn requirement(&self) -> String {
        match self.kind() {
            DescriptorKind::Concrete => format!("extend type {}", self),
            DescriptorKind::Structural => format!("implement capability {}", self),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&short_type_name(self.name))
    }
}

/// Strips module paths from every component of a type name
///
/// `alloc::collections::linked_list::LinkedList<f32>` becomes `LinkedList<f32>`.
pub(crate) fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut path = String::new();
    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            path.push(ch);
        } else {
            push_last_segment(&mut out, &path);
            path.clear();
            out.push(ch);
        }
    }
    push_last_segment(&mut out, &path);
    out
}

fn push_last_segment(out: &mut String, path: &str) {
    out.push_str(path.rsplit("::").next().unwrap_or(path));
}
