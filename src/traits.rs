// src/traits.rs
use crate::any_value::{IntoValue, Value};
use crate::descriptor::short_type_name;
use crate::MapError;
use std::collections::{LinkedList, VecDeque};
use std::marker::PhantomData;
use std::rc::Rc;

/// An ordered sequence whose element type has been erased
///
/// Elements come back as `Rc<dyn Value>`, so a key typed for a list of `f32`
/// can only verify that a value is a list, never what the list holds.
///
/// A type implementing `List` must also return itself from
/// [`Value::into_list`]; keys only see a value as a list through that view.
///
/// # Examples
///
/// ```
/// use sovran_keymap::List;
/// use std::rc::Rc;
///
/// let floats: Rc<dyn List> = Rc::new(vec![1.5f32, 2.5]);
/// assert_eq!(floats.len(), 2);
/// assert_eq!(floats.element_as::<f32>(1).as_deref(), Some(&2.5));
/// assert!(floats.element_as::<f64>(1).is_none());
/// assert!(floats.is_random_access());
/// ```
pub trait List: Value + IntoValue {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A shared copy of the element at `index`
    fn element(&self, index: usize) -> Option<Rc<dyn Value>>;

    /// Whether `element` takes constant time
    fn is_random_access(&self) -> bool {
        false
    }
}

impl dyn List {
    /// The element at `index`, if it exists and is a `E`
    pub fn element_as<E: Value>(&self, index: usize) -> Option<Rc<E>> {
        self.element(index)?.into_any().downcast::<E>().ok()
    }
}

fn share<T: Value + Clone>(element: &T) -> Rc<dyn Value> {
    Rc::new(element.clone())
}

impl<T: Value + Clone> List for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn element(&self, index: usize) -> Option<Rc<dyn Value>> {
        self.get(index).map(share)
    }

    fn is_random_access(&self) -> bool {
        true
    }
}

impl<T: Value + Clone> List for VecDeque<T> {
    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn element(&self, index: usize) -> Option<Rc<dyn Value>> {
        self.get(index).map(share)
    }

    fn is_random_access(&self) -> bool {
        true
    }
}

impl<T: Value + Clone> List for LinkedList<T> {
    fn len(&self) -> usize {
        LinkedList::len(self)
    }

    fn element(&self, index: usize) -> Option<Rc<dyn Value>> {
        self.iter().nth(index).map(share)
    }
}

/// A callable taking one argument whose type has been erased
pub trait Consumer: Value + IntoValue {
    /// Invokes the callable
    ///
    /// # Errors
    ///
    /// Returns `MapError::ArgumentMismatch` if `arg` is not of the type the
    /// callable was written for.
    fn accept(&self, arg: Rc<dyn Value>) -> Result<(), MapError>;
}

/// Adapts a closure over `&A` into a [`Consumer`]
///
/// # Examples
///
/// ```
/// use sovran_keymap::{Consumer, FnConsumer, MapError, Value};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let total = Rc::new(Cell::new(0));
/// let sink = Rc::clone(&total);
/// let add: Rc<dyn Consumer> = Rc::new(FnConsumer::new(move |n: &i32| sink.set(sink.get() + n)));
///
/// add.accept(Rc::new(5i32))?;
/// add.accept(Rc::new(7i32))?;
/// assert_eq!(total.get(), 12);
///
/// // The argument type is only known to the closure.
/// assert!(matches!(
///     add.accept(Rc::new("seven".to_string())),
///     Err(MapError::ArgumentMismatch { .. })
/// ));
/// # Ok::<(), MapError>(())
/// ```
pub struct FnConsumer<A, F> {
    f: F,
    _arg: PhantomData<fn(&A)>,
}

impl<A, F> FnConsumer<A, F>
where
    A: Value,
    F: Fn(&A) + 'static,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _arg: PhantomData,
        }
    }
}

impl<A, F> Value for FnConsumer<A, F>
where
    A: Value,
    F: Fn(&A) + 'static,
{
    fn into_consumer(self: Rc<Self>) -> Option<Rc<dyn Consumer>> {
        Some(self)
    }
}

impl<A, F> Consumer for FnConsumer<A, F>
where
    A: Value,
    F: Fn(&A) + 'static,
{
    fn accept(&self, arg: Rc<dyn Value>) -> Result<(), MapError> {
        let arg: &dyn Value = &*arg;
        match arg.as_any().downcast_ref::<A>() {
            Some(value) => {
                (self.f)(value);
                Ok(())
            }
            None => Err(MapError::ArgumentMismatch {
                expected: short_type_name(std::any::type_name::<A>()),
                actual: short_type_name(arg.type_name()),
            }),
        }
    }
}
