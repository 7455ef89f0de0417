use crate::traits::{Consumer, List};
use std::any::Any;
use std::collections::{LinkedList, VecDeque};
use std::rc::Rc;

/// Access to the concrete type behind a `dyn Value`
///
/// Implemented for every sized `'static` type and reachable only through
/// [`Value`] trait objects, so a `Rc<dyn Value>` always reports the value it
/// holds rather than the `Rc`.
///
/// ```compile_fail
/// use sovran_keymap::AsAny;
/// ```
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
    /// Fully qualified name of the concrete type
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A value that can be stored in a [`TypeMap`](crate::TypeMap)
///
/// Besides its concrete type, a value can hand out an erased [`List`] or
/// [`Consumer`] view of itself. Those views are what structural
/// [`Capability`](crate::Capability) checks look at, so a type implementing
/// `List` must return it from `into_list` to be accepted as one.
///
/// # Examples
///
/// ```
/// use sovran_keymap::{Capability, Value};
/// use std::rc::Rc;
///
/// struct Celsius(f64);
/// impl Value for Celsius {}
///
/// let reading: Rc<dyn Value> = Rc::new(Celsius(21.5));
/// assert!(!Capability::List.satisfied_by(&reading));
/// assert!(reading.into_list().is_none());
///
/// let floats: Rc<dyn Value> = Rc::new(vec![1.0f32]);
/// assert!(Capability::RandomAccess.satisfied_by(&floats));
/// ```
pub trait Value: AsAny {
    fn into_list(self: Rc<Self>) -> Option<Rc<dyn List>> {
        None
    }

    fn into_consumer(self: Rc<Self>) -> Option<Rc<dyn Consumer>> {
        None
    }
}

/// Widens a shared value to `Rc<dyn Value>`
pub trait IntoValue {
    fn into_value(self: Rc<Self>) -> Rc<dyn Value>;
}

impl<T: Value> IntoValue for T {
    fn into_value(self: Rc<Self>) -> Rc<dyn Value> {
        self
    }
}

macro_rules! impl_plain_value {
    ($($ty:ty),* $(,)?) => {
        $(impl Value for $ty {})*
    };
}

impl_plain_value!(
    String,
    &'static str,
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
);

macro_rules! impl_list_value {
    ($($ty:ident),* $(,)?) => {
        $(impl<T: Value + Clone> Value for $ty<T> {
            fn into_list(self: Rc<Self>) -> Option<Rc<dyn List>> {
                Some(self)
            }
        })*
    };
}

impl_list_value!(Vec, VecDeque, LinkedList);
