//! # sovran-keymap
//!
//! A type-safe heterogeneous container keyed by a closed set of typed keys.
//!
//! `sovran-keymap` stores values of many unrelated types in one map. Every key
//! is a member of the fixed [`KeyVariant`] enumeration and is bound to a base
//! [`TypeDescriptor`] plus an ordered list of extra capabilities. Each value is
//! checked against those descriptors when it is stored and again when it is
//! read.
//!
//! ## Key Features
//!
//! - **Closed key set**: keys are enum variants fixed at compile time, and two
//!   keys with the same value type are still separate entries
//! - **Typed accessors**: `KeyVariant::a_double()` returns a `Key<f64>`, so
//!   `put` and `get` are statically typed
//! - **Capability checks**: a key can demand structural capabilities, such as
//!   a list that supports random access
//! - **Shared values**: values are held as `Rc` references, never copied
//! - **Honest about erasure**: keys over erased lists and consumers only check
//!   the outer shape, and say so
//!
//! ## Usage Examples
//!
//! ### Basic Usage
//!
//! ```rust
//! use sovran_keymap::{KeyVariant, MapError, TypeMap};
//! use std::rc::Rc;
//!
//! fn main() -> Result<(), MapError> {
//!     let mut map = TypeMap::new();
//!
//!     // Store values of different types
//!     map.put(KeyVariant::string()?, Rc::new("Hi there, {}!".to_string()))?;
//!     map.put(KeyVariant::an_integer()?, Rc::new(-8))?;
//!     map.put(KeyVariant::a_double()?, Rc::new(std::f64::consts::PI))?;
//!     map.put(KeyVariant::another_double()?, Rc::new(std::f64::consts::E))?;
//!
//!     // Retrieve them, typed by their keys
//!     let format = map.get(KeyVariant::string()?)?.unwrap_or_default();
//!     let pi = map.get(KeyVariant::a_double()?)?.unwrap_or_default();
//!     let e = map.get(KeyVariant::another_double()?)?.unwrap_or_default();
//!
//!     println!("{}", format.replace("{}", "user"));
//!     assert!((pi.cos() + 1.0).abs() < 1e-12);
//!     assert!((e.ln() - 1.0).abs() < 1e-12);
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Capability Constraints
//!
//! ```rust
//! use sovran_keymap::{KeyVariant, List, MapError, TypeMap};
//! use std::collections::LinkedList;
//! use std::rc::Rc;
//!
//! let mut map = TypeMap::new();
//! let floats = KeyVariant::floats_random_access()?;
//!
//! // A Vec supports random access
//! let vec: Rc<dyn List> = Rc::new(vec![1.5f32, 2.5]);
//! map.put(floats, vec)?;
//!
//! // A LinkedList is a list, but not a random-access one
//! let linked: Rc<dyn List> = Rc::new(LinkedList::<f32>::new());
//! match map.put(floats, linked) {
//!     Err(err @ MapError::TypeMismatch { .. }) => println!("{}", err),
//!     other => panic!("expected a type mismatch, got {:?}", other.map(|_| ())),
//! }
//!
//! // The original list is still there
//! assert_eq!(map.get(floats)?.map(|list| list.len()), Some(2));
//! # Ok::<(), MapError>(())
//! ```
//!
//! ### Sharing Streams
//!
//! ```rust
//! use sovran_keymap::{Consumer, KeyVariant, MapError, PrintStream, TypeMap};
//! use std::rc::Rc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut map = TypeMap::new();
//!     let out = Rc::new(PrintStream::stdout());
//!
//!     map.put(KeyVariant::out()?, Rc::clone(&out))?;
//!     let println: Rc<dyn Consumer> = Rc::new(out.println_consumer());
//!     map.put(KeyVariant::out_println_string()?, println)?;
//!
//!     if let Some(out) = map.get(KeyVariant::out()?)? {
//!         out.println("printed through the stored stream")?;
//!     }
//!     if let Some(println) = map.get(KeyVariant::out_println_string()?)? {
//!         println.accept(Rc::new("printed through the stored consumer".to_string()))?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Error Handling
//!
//! ```rust
//! use sovran_keymap::{KeyVariant, MapError, Value};
//! use std::rc::Rc;
//!
//! let key = KeyVariant::an_integer()?;
//!
//! // Absent values pass every check
//! assert!(key.cast(None)?.is_none());
//!
//! let text: Rc<dyn Value> = Rc::new("eight".to_string());
//! match key.cast(Some(text)) {
//!     Ok(_) => println!("unexpected"),
//!     Err(MapError::TypeMismatch { key, actual, failed }) => {
//!         assert_eq!(key, "AN_INTEGER(i32)");
//!         assert_eq!(actual, "String");
//!         assert_eq!(failed.to_string(), "i32");
//!     }
//!     Err(e) => println!("Other error: {}", e),
//! }
//! # Ok::<(), MapError>(())
//! ```
//!
//! ## Erased Keys
//!
//! `FLOATS_RANDOM_ACCESS` is meant to hold `f32`s and `OUT_PRINTLN_STRING` is
//! meant to accept `String`s, but both are typed over erased views
//! ([`List`] and [`Consumer`]). Only the outer shape is checked: a list of
//! strings, or a consumer of integers, is accepted. A consumer given an
//! argument it cannot handle reports [`MapError::ArgumentMismatch`] when it is
//! called.

mod any_value;
mod descriptor;
mod error;
mod key;
mod map;
mod streams;
mod traits;
mod typed;

pub use any_value::{IntoValue, Value};
pub use descriptor::{Capability, DescriptorKind, TypeDescriptor};
pub use error::MapError;
pub use key::KeyVariant;
pub use map::TypeMap;
pub use streams::{InputStream, PrintStream};
pub use traits::{Consumer, FnConsumer, List};
pub use typed::{Key, Storable};
