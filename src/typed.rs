use crate::any_value::Value;
use crate::descriptor::{short_type_name, Capability, TypeDescriptor};
use crate::key::KeyVariant;
use crate::streams::{InputStream, PrintStream};
use crate::traits::{Consumer, List};
use crate::MapError;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

mod sealed {
    use crate::any_value::Value;
    use std::rc::Rc;

    /// Moves values in and out of the erased form a map stores
    pub trait Erase {
        fn erase(value: Rc<Self>) -> Rc<dyn Value>;

        /// Recovers the typed value; only called after the key's check passed
        fn restore(value: Rc<dyn Value>) -> Option<Rc<Self>>;
    }
}

/// A type a [`Key`] can be typed for
///
/// `descriptor` is the base descriptor a key's variant must be bound to.
/// For sized values it is the exact type. For the erased `dyn List` and
/// `dyn Consumer` views it is only the outer shape, since neither the element
/// type nor the argument type survives erasure.
///
/// Implemented for every [`Value`] and for the two erased views; it cannot be
/// implemented outside this crate, and values only leave their erased form
/// through a key's check.
///
/// ```compile_fail
/// use sovran_keymap::{Storable, Value};
/// use std::rc::Rc;
///
/// let erased: Rc<dyn Value> = Rc::new(1.5f64);
/// let unchecked = <f64 as Storable>::restore(erased);
/// ```
pub trait Storable: sealed::Erase + 'static {
    fn descriptor() -> TypeDescriptor;
}

impl<T: Value> Storable for T {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<T>()
    }
}

impl<T: Value> sealed::Erase for T {
    fn erase(value: Rc<Self>) -> Rc<dyn Value> {
        value
    }

    fn restore(value: Rc<dyn Value>) -> Option<Rc<Self>> {
        value.into_any().downcast::<T>().ok()
    }
}

impl Storable for dyn List {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::capability(Capability::List)
    }
}

impl sealed::Erase for dyn List {
    fn erase(value: Rc<Self>) -> Rc<dyn Value> {
        value.into_value()
    }

    fn restore(value: Rc<dyn Value>) -> Option<Rc<Self>> {
        value.into_list()
    }
}

impl Storable for dyn Consumer {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::capability(Capability::Consumer)
    }
}

impl sealed::Erase for dyn Consumer {
    fn erase(value: Rc<Self>) -> Rc<dyn Value> {
        value.into_value()
    }

    fn restore(value: Rc<dyn Value>) -> Option<Rc<Self>> {
        value.into_consumer()
    }
}

/// A [`KeyVariant`] typed for values of `T`
///
/// Obtained only through the accessor for its variant, which checks that the
/// variant is bound to `T`'s descriptor. Keys are `Copy` and cheap to pass
/// around; a map stores entries by the underlying variant alone.
///
/// # Examples
///
/// ```
/// use sovran_keymap::{KeyVariant, MapError, Value};
/// use std::rc::Rc;
///
/// let pi = KeyVariant::a_double()?;
/// assert_eq!(pi.key_name(), "A_DOUBLE(f64)");
///
/// let value: Rc<dyn Value> = Rc::new(std::f64::consts::PI);
/// let typed: Rc<f64> = pi.cast(Some(value))?.unwrap();
/// assert_eq!(*typed, std::f64::consts::PI);
///
/// let wrong: Rc<dyn Value> = Rc::new(3i32);
/// assert!(matches!(pi.cast(Some(wrong)), Err(MapError::TypeMismatch { .. })));
/// # Ok::<(), MapError>(())
/// ```
pub struct Key<T: ?Sized> {
    variant: KeyVariant,
    _type: PhantomData<fn() -> Rc<T>>,
}

impl<T: ?Sized> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Key<T> {}

impl<T: ?Sized> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.variant == other.variant
    }
}

impl<T: ?Sized> Eq for Key<T> {}

impl<T: ?Sized> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Key").field(&self.variant).finish()
    }
}

impl<T: ?Sized> fmt::Display for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.variant, f)
    }
}

impl<T: ?Sized> From<Key<T>> for KeyVariant {
    fn from(key: Key<T>) -> Self {
        key.variant
    }
}

impl<T: Storable + ?Sized> Key<T> {
    /// Types `variant` for `T` after checking its base descriptor
    ///
    /// # Errors
    ///
    /// Returns `MapError::AccessorInvariant` if `variant` is bound to a
    /// different base type.
    pub(crate) fn bind(variant: KeyVariant) -> Result<Self, MapError> {
        let expected = T::descriptor();
        if variant.base_type() != expected {
            return Err(MapError::AccessorInvariant {
                key: variant.key_name().to_string(),
                expected,
            });
        }
        Ok(Self {
            variant,
            _type: PhantomData,
        })
    }

    pub fn variant(&self) -> KeyVariant {
        self.variant
    }

    pub fn base_type(&self) -> TypeDescriptor {
        self.variant.base_type()
    }

    pub fn extra_capabilities(&self) -> &'static [TypeDescriptor] {
        self.variant.extra_capabilities()
    }

    pub fn key_name(&self) -> &'static str {
        self.variant.key_name()
    }

    /// Whether `value` also satisfies this key's extra capabilities
    pub fn is_instance(&self, value: &Rc<T>) -> bool {
        let erased = T::erase(Rc::clone(value));
        self.variant.is_instance(Some(&erased))
    }

    /// Checks an untyped value against this key and recovers it as `T`
    ///
    /// An absent value passes through as `None`.
    ///
    /// # Errors
    ///
    /// Returns `MapError::TypeMismatch` if the value fails the base descriptor
    /// or any extra capability.
    pub fn cast(&self, value: Option<Rc<dyn Value>>) -> Result<Option<Rc<T>>, MapError> {
        self.variant
            .cast(value)?
            .map(|value| self.restore(value))
            .transpose()
    }

    /// Runs the full check on a value that is already statically a `T`
    ///
    /// Useful when `T` is an erased view: a consumer written for any argument
    /// type is a `dyn Consumer`, and only its outer shape can be verified here.
    ///
    /// # Errors
    ///
    /// Returns `MapError::TypeMismatch` exactly when [`Key::cast`] would.
    pub fn coerce_cast(&self, value: Rc<T>) -> Result<Rc<T>, MapError> {
        let erased_value = T::erase(value);
        self.variant.check(&erased_value)?;
        self.restore(erased_value)
    }

    /// Runs the same path as [`Key::cast`] and returns the erased value a map
    /// stores
    pub(crate) fn admit(&self, value: Rc<T>) -> Result<Rc<dyn Value>, MapError> {
        let erased_value = T::erase(value);
        self.variant.check(&erased_value)?;
        self.restore(Rc::clone(&erased_value))?;
        Ok(erased_value)
    }

    fn restore(&self, value: Rc<dyn Value>) -> Result<Rc<T>, MapError> {
        let actual = short_type_name((*value).type_name());
        T::restore(value).ok_or_else(|| MapError::TypeMismatch {
            key: self.key_name().to_string(),
            actual,
            failed: T::descriptor(),
        })
    }
}

// Typed accessors, one per variant.
impl KeyVariant {
    pub fn string() -> Result<Key<String>, MapError> {
        Key::bind(KeyVariant::String)
    }

    pub fn an_integer() -> Result<Key<i32>, MapError> {
        Key::bind(KeyVariant::AnInteger)
    }

    pub fn a_double() -> Result<Key<f64>, MapError> {
        Key::bind(KeyVariant::ADouble)
    }

    /// Same value type as [`KeyVariant::a_double`], stored separately
    pub fn another_double() -> Result<Key<f64>, MapError> {
        Key::bind(KeyVariant::AnotherDouble)
    }

    pub fn out() -> Result<Key<PrintStream>, MapError> {
        Key::bind(KeyVariant::Out)
    }

    pub fn err() -> Result<Key<PrintStream>, MapError> {
        Key::bind(KeyVariant::Err)
    }

    pub fn input() -> Result<Key<InputStream>, MapError> {
        Key::bind(KeyVariant::In)
    }

    /// A random-access list meant to hold `f32`
    ///
    /// Only the `List` and `RandomAccess` capabilities are enforced; the
    /// element type is not.
    pub fn floats_random_access() -> Result<Key<dyn List>, MapError> {
        Key::bind(KeyVariant::FloatsRandomAccess)
    }

    /// A consumer meant to accept `String`
    ///
    /// Only the `Consumer` capability is enforced; the argument type is not.
    pub fn out_println_string() -> Result<Key<dyn Consumer>, MapError> {
        Key::bind(KeyVariant::OutPrintlnString)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::FnConsumer;
    use std::collections::LinkedList;

    #[test]
    fn test_accessors_bind_their_variant() -> Result<(), MapError> {
        assert_eq!(KeyVariant::string()?.variant(), KeyVariant::String);
        assert_eq!(KeyVariant::an_integer()?.variant(), KeyVariant::AnInteger);
        assert_eq!(KeyVariant::a_double()?.variant(), KeyVariant::ADouble);
        assert_eq!(KeyVariant::another_double()?.variant(), KeyVariant::AnotherDouble);
        assert_eq!(KeyVariant::out()?.variant(), KeyVariant::Out);
        assert_eq!(KeyVariant::err()?.variant(), KeyVariant::Err);
        assert_eq!(KeyVariant::input()?.variant(), KeyVariant::In);
        assert_eq!(
            KeyVariant::floats_random_access()?.variant(),
            KeyVariant::FloatsRandomAccess
        );
        assert_eq!(
            KeyVariant::out_println_string()?.variant(),
            KeyVariant::OutPrintlnString
        );
        Ok(())
    }

    #[test]
    fn test_bind_rejects_wrong_type() {
        match Key::<i32>::bind(KeyVariant::String) {
            Err(MapError::AccessorInvariant { key, expected }) => {
                assert_eq!(key, "STRING(String)");
                assert_eq!(expected, TypeDescriptor::of::<i32>());
            }
            other => panic!("expected accessor invariant violation, got {:?}", other),
        }

        assert!(Key::<dyn List>::bind(KeyVariant::OutPrintlnString).is_err());
        assert!(Key::<f64>::bind(KeyVariant::AnotherDouble).is_ok());
    }

    #[test]
    fn test_accessor_error_message() {
        let err = Key::<f32>::bind(KeyVariant::ADouble).unwrap_err();
        assert_eq!(err.to_string(), "Type f32 incorrect for A_DOUBLE(f64)");
    }

    #[test]
    fn test_key_identity_is_the_variant() -> Result<(), MapError> {
        let first = KeyVariant::a_double()?;
        let second = KeyVariant::another_double()?;
        assert_ne!(first, second);
        assert_eq!(first, KeyVariant::a_double()?);
        assert_eq!(KeyVariant::from(second), KeyVariant::AnotherDouble);
        assert_eq!(format!("{}", first), "A_DOUBLE(f64)");
        assert_eq!(format!("{:?}", first), "Key(ADouble)");
        Ok(())
    }

    #[test]
    fn test_cast_restores_typed_value() -> Result<(), MapError> {
        let key = KeyVariant::string()?;
        let original = Rc::new("Hi there".to_string());
        let restored = key.cast(Some(original.clone()))?.unwrap();
        assert!(Rc::ptr_eq(&original, &restored));
        assert!(key.cast(None)?.is_none());
        Ok(())
    }

    #[test]
    fn test_cast_restores_list_view() -> Result<(), MapError> {
        let key = KeyVariant::floats_random_access()?;
        let floats = Rc::new(vec![0.5f32, 1.5]);
        let restored = key.cast(Some(floats.clone()))?.unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.element_as::<f32>(0).as_deref(), Some(&0.5));
        assert!(std::ptr::eq(
            Rc::as_ptr(&floats).cast::<()>(),
            Rc::as_ptr(&restored).cast::<()>()
        ));
        Ok(())
    }

    #[test]
    fn test_is_instance_checks_extras() -> Result<(), MapError> {
        let key = KeyVariant::floats_random_access()?;
        let vec: Rc<dyn List> = Rc::new(Vec::<f32>::new());
        let linked: Rc<dyn List> = Rc::new(LinkedList::<f32>::new());
        assert!(key.is_instance(&vec));
        assert!(!key.is_instance(&linked));
        Ok(())
    }

    #[test]
    fn test_coerce_cast_checks_shape_only() -> Result<(), MapError> {
        let key = KeyVariant::out_println_string()?;
        let counts: Rc<dyn Consumer> = Rc::new(FnConsumer::new(|_: &i32| {}));
        let coerced = key.coerce_cast(Rc::clone(&counts))?;
        assert!(matches!(
            coerced.accept(Rc::new("text".to_string())),
            Err(MapError::ArgumentMismatch { .. })
        ));

        let key = KeyVariant::floats_random_access()?;
        let linked: Rc<dyn List> = Rc::new(LinkedList::<f32>::new());
        match key.coerce_cast(linked) {
            Err(MapError::TypeMismatch { failed, .. }) => {
                assert_eq!(failed, TypeDescriptor::capability(Capability::RandomAccess));
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("linked list should not be random access"),
        }
        Ok(())
    }
}
