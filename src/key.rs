use crate::any_value::Value;
use crate::descriptor::{short_type_name, Capability, TypeDescriptor};
use crate::streams::{InputStream, PrintStream};
use crate::MapError;
use once_cell::sync::Lazy;
use std::fmt;
use std::rc::Rc;

/// The closed set of keys a [`TypeMap`](crate::TypeMap) can hold
///
/// Each variant is bound once, when the registry is built, to a base
/// descriptor and an ordered list of extra capability descriptors. Variants
/// sharing a base type are still distinct keys.
///
/// Use the typed accessors (`KeyVariant::a_double()` and friends) to get a
/// [`Key<T>`](crate::Key) for reading and writing a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyVariant {
    String,
    AnInteger,
    ADouble,
    AnotherDouble,
    Out,
    Err,
    In,
    FloatsRandomAccess,
    OutPrintlnString,
}

impl KeyVariant {
    /// Every variant, in declaration order
    pub const ALL: [KeyVariant; 9] = [
        KeyVariant::String,
        KeyVariant::AnInteger,
        KeyVariant::ADouble,
        KeyVariant::AnotherDouble,
        KeyVariant::Out,
        KeyVariant::Err,
        KeyVariant::In,
        KeyVariant::FloatsRandomAccess,
        KeyVariant::OutPrintlnString,
    ];

    pub fn name(self) -> &'static str {
        match self {
            KeyVariant::String => "STRING",
            KeyVariant::AnInteger => "AN_INTEGER",
            KeyVariant::ADouble => "A_DOUBLE",
            KeyVariant::AnotherDouble => "ANOTHER_DOUBLE",
            KeyVariant::Out => "OUT",
            KeyVariant::Err => "ERR",
            KeyVariant::In => "IN",
            KeyVariant::FloatsRandomAccess => "FLOATS_RANDOM_ACCESS",
            KeyVariant::OutPrintlnString => "OUT_PRINTLN_STRING",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn binding(self) -> &'static KeyBinding {
        &KeyRegistry::global().bindings[self.index()]
    }

    pub fn base_type(self) -> TypeDescriptor {
        self.binding().base
    }

    /// Extra capabilities in the order they are checked
    pub fn extra_capabilities(self) -> &'static [TypeDescriptor] {
        &self.binding().extras
    }

    /// The variant name followed by its descriptors, e.g. `A_DOUBLE(f64)`
    pub fn key_name(self) -> &'static str {
        &self.binding().key_name
    }

    /// The first descriptor `value` fails, or `None` if it satisfies them all
    ///
    /// An absent value satisfies every descriptor.
    pub fn type_check(self, value: Option<&Rc<dyn Value>>) -> Option<TypeDescriptor> {
        let value = value?;
        let binding = self.binding();
        std::iter::once(&binding.base)
            .chain(binding.extras.iter())
            .find(|descriptor| !descriptor.matches(value))
            .copied()
    }

    pub fn is_instance(self, value: Option<&Rc<dyn Value>>) -> bool {
        self.type_check(value).is_none()
    }

    /// Returns `value` unchanged if it satisfies this key
    ///
    /// # Errors
    ///
    /// Returns `MapError::TypeMismatch` naming the first descriptor the value
    /// fails.
    pub fn cast(self, value: Option<Rc<dyn Value>>) -> Result<Option<Rc<dyn Value>>, MapError> {
        match value {
            Some(value) => self.check(&value).map(|()| Some(value)),
            None => Ok(None),
        }
    }

    pub(crate) fn check(self, value: &Rc<dyn Value>) -> Result<(), MapError> {
        match self.type_check(Some(value)) {
            None => Ok(()),
            Some(failed) => {
                let actual = short_type_name((**value).type_name());
                tracing::debug!(key = self.key_name(), %actual, %failed, "value rejected");
                Err(MapError::TypeMismatch {
                    key: self.key_name().to_string(),
                    actual,
                    failed,
                })
            }
        }
    }
}

impl fmt::Display for KeyVariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key_name())
    }
}

/// Declares the descriptors one variant is bound to
#[derive(Debug, Clone)]
pub(crate) struct KeyDecl {
    variant: KeyVariant,
    base: TypeDescriptor,
    extras: Vec<TypeDescriptor>,
}

impl KeyDecl {
    pub(crate) fn new(variant: KeyVariant, base: TypeDescriptor) -> Self {
        Self {
            variant,
            base,
            extras: Vec::new(),
        }
    }

    pub(crate) fn with_capabilities(mut self, extras: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        self.extras.extend(extras);
        self
    }
}

#[derive(Debug)]
struct KeyBinding {
    base: TypeDescriptor,
    extras: Vec<TypeDescriptor>,
    key_name: String,
}

/// The validated bindings for every variant, indexed by declaration order
#[derive(Debug)]
pub(crate) struct KeyRegistry {
    bindings: Vec<KeyBinding>,
}

static REGISTRY: Lazy<KeyRegistry> = Lazy::new(|| {
    KeyRegistry::build(declarations()).unwrap_or_else(|err| panic!("{}", err))
});

fn declarations() -> Vec<KeyDecl> {
    vec![
        KeyDecl::new(KeyVariant::String, TypeDescriptor::of::<String>()),
        KeyDecl::new(KeyVariant::AnInteger, TypeDescriptor::of::<i32>()),
        KeyDecl::new(KeyVariant::ADouble, TypeDescriptor::of::<f64>()),
        KeyDecl::new(KeyVariant::AnotherDouble, TypeDescriptor::of::<f64>()),
        KeyDecl::new(KeyVariant::Out, TypeDescriptor::of::<PrintStream>()),
        KeyDecl::new(KeyVariant::Err, TypeDescriptor::of::<PrintStream>()),
        KeyDecl::new(KeyVariant::In, TypeDescriptor::of::<InputStream>()),
        KeyDecl::new(
            KeyVariant::FloatsRandomAccess,
            TypeDescriptor::capability(Capability::List),
        )
        .with_capabilities([TypeDescriptor::capability(Capability::RandomAccess)]),
        KeyDecl::new(
            KeyVariant::OutPrintlnString,
            TypeDescriptor::capability(Capability::Consumer),
        ),
    ]
}

impl KeyRegistry {
    /// The process-wide registry, built on first use
    ///
    /// # Panics
    ///
    /// Panics if the built-in declarations are inconsistent. Nothing can use
    /// a key before this succeeds.
    pub(crate) fn global() -> &'static KeyRegistry {
        &REGISTRY
    }

    /// Validates `decls` and binds every variant exactly once
    ///
    /// # Errors
    ///
    /// Returns `MapError::Configuration` if an extra capability is a concrete
    /// type, or if a variant is declared twice or not at all.
    pub(crate) fn build(decls: impl IntoIterator<Item = KeyDecl>) -> Result<Self, MapError> {
        let mut slots: Vec<Option<KeyBinding>> = KeyVariant::ALL.iter().map(|_| None).collect();

        for decl in decls {
            if let Some(concrete) = decl.extras.iter().find(|extra| !extra.is_structural()) {
                return Err(MapError::Configuration(format!(
                    "{} declares {} as an extra capability, but it is not a capability",
                    decl.variant.name(),
                    concrete
                )));
            }

            let slot = &mut slots[decl.variant.index()];
            if slot.is_some() {
                return Err(MapError::Configuration(format!(
                    "{} is declared more than once",
                    decl.variant.name()
                )));
            }

            let descriptors: Vec<String> = std::iter::once(&decl.base)
                .chain(decl.extras.iter())
                .map(|descriptor| descriptor.to_string())
                .collect();
            *slot = Some(KeyBinding {
                key_name: format!("{}({})", decl.variant.name(), descriptors.join(",")),
                base: decl.base,
                extras: decl.extras,
            });
        }

        let bindings = slots
            .into_iter()
            .zip(KeyVariant::ALL)
            .map(|(slot, variant)| {
                slot.ok_or_else(|| {
                    MapError::Configuration(format!("{} is never declared", variant.name()))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(keys = bindings.len(), "key registry built");
        Ok(Self { bindings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::LinkedList;

    fn shared<T: Value>(value: T) -> Rc<dyn Value> {
        Rc::new(value)
    }

    fn rejection<T>(result: Result<T, MapError>) -> MapError {
        match result {
            Err(err) => err,
            Ok(_) => panic!("value should have been rejected"),
        }
    }

    #[test]
    fn test_key_names() {
        assert_eq!(KeyVariant::String.key_name(), "STRING(String)");
        assert_eq!(KeyVariant::AnInteger.key_name(), "AN_INTEGER(i32)");
        assert_eq!(KeyVariant::ADouble.key_name(), "A_DOUBLE(f64)");
        assert_eq!(KeyVariant::AnotherDouble.key_name(), "ANOTHER_DOUBLE(f64)");
        assert_eq!(KeyVariant::Out.key_name(), "OUT(PrintStream)");
        assert_eq!(KeyVariant::Err.key_name(), "ERR(PrintStream)");
        assert_eq!(KeyVariant::In.key_name(), "IN(InputStream)");
        assert_eq!(
            KeyVariant::FloatsRandomAccess.key_name(),
            "FLOATS_RANDOM_ACCESS(List,RandomAccess)"
        );
        assert_eq!(
            KeyVariant::OutPrintlnString.key_name(),
            "OUT_PRINTLN_STRING(Consumer)"
        );
        assert_eq!(KeyVariant::ADouble.to_string(), "A_DOUBLE(f64)");
    }

    #[test]
    fn test_bindings() {
        assert_eq!(KeyVariant::ADouble.base_type(), KeyVariant::AnotherDouble.base_type());
        assert_ne!(KeyVariant::ADouble, KeyVariant::AnotherDouble);
        assert!(KeyVariant::ADouble.extra_capabilities().is_empty());
        assert_eq!(
            KeyVariant::FloatsRandomAccess.extra_capabilities(),
            &[TypeDescriptor::capability(Capability::RandomAccess)]
        );
    }

    #[test]
    fn test_absent_value_satisfies_every_key() {
        for variant in KeyVariant::ALL {
            assert_eq!(variant.type_check(None), None);
            assert!(variant.is_instance(None));
            assert!(variant.cast(None).unwrap().is_none());
        }
    }

    #[test]
    fn test_base_checked_before_extras() {
        // Neither a list nor random access: the base is reported
        let failed = KeyVariant::FloatsRandomAccess.type_check(Some(&shared(1.0f32)));
        assert_eq!(failed, Some(TypeDescriptor::capability(Capability::List)));

        let failed = KeyVariant::FloatsRandomAccess.type_check(Some(&shared(LinkedList::<f32>::new())));
        assert_eq!(failed, Some(TypeDescriptor::capability(Capability::RandomAccess)));

        assert_eq!(KeyVariant::FloatsRandomAccess.type_check(Some(&shared(vec![1.0f32]))), None);
    }

    #[test]
    fn test_cast_returns_same_value() {
        let value: Rc<dyn Value> = Rc::new(-8i32);
        let cast = KeyVariant::AnInteger.cast(Some(Rc::clone(&value))).unwrap().unwrap();
        assert!(Rc::ptr_eq(&value, &cast));
    }

    #[test]
    fn test_cast_mismatch_message() {
        let err = rejection(KeyVariant::ADouble.cast(Some(Rc::new("pi".to_string()))));
        assert_eq!(
            err.to_string(),
            "Key A_DOUBLE(f64) rejected value of type String: Does not extend type f64"
        );

        let err = rejection(KeyVariant::FloatsRandomAccess.cast(Some(Rc::new(LinkedList::<f32>::new()))));
        assert_eq!(
            err.to_string(),
            "Key FLOATS_RANDOM_ACCESS(List,RandomAccess) rejected value of type LinkedList<f32>: \
             Does not implement capability RandomAccess"
        );
    }

    #[test]
    fn test_build_rejects_concrete_extra() {
        let decls = declarations().into_iter().map(|decl| {
            if decl.variant == KeyVariant::ADouble {
                decl.with_capabilities([TypeDescriptor::of::<f32>()])
            } else {
                decl
            }
        });
        match KeyRegistry::build(decls) {
            Err(MapError::Configuration(message)) => {
                assert!(message.contains("A_DOUBLE"));
                assert!(message.contains("f32"));
            }
            other => panic!("expected configuration error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_build_rejects_duplicate_and_missing() {
        let mut decls = declarations();
        decls.push(KeyDecl::new(KeyVariant::In, TypeDescriptor::of::<InputStream>()));
        assert!(matches!(
            KeyRegistry::build(decls),
            Err(MapError::Configuration(message)) if message.contains("IN is declared more than once")
        ));

        let decls = declarations()
            .into_iter()
            .filter(|decl| decl.variant != KeyVariant::Out);
        assert!(matches!(
            KeyRegistry::build(decls),
            Err(MapError::Configuration(message)) if message.contains("OUT is never declared")
        ));
    }

    #[test]
    fn test_build_accepts_declarations() {
        let registry = KeyRegistry::build(declarations()).unwrap();
        assert_eq!(registry.bindings.len(), KeyVariant::ALL.len());
    }
}
