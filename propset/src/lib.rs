//! Lazily built, cached sets of named property objects.
//!
//! A property set is declared by implementing [`PropertySetDecl`], which lists
//! the property names and types of the set. Wrapping the declaration in a
//! [`PropertySet`] gives an object whose properties are built on first access,
//! exactly once, in declaration order. Properties that implement
//! [`NameAware`] or [`OwnerAware`] learn their name and the set they belong to.
//! Replacing a property through the set is never allowed.
//!
//! Declarations can also be read from `@property` annotations of classes
//! registered with [`register_class!`], whose type names are resolved through
//! the [`TypeRegistry`] (see [`docblock`] and [`class`]).

extern crate self as propset;

pub mod class;
pub mod config;
pub mod declaration;
pub mod docblock;
pub mod property;
pub mod registry;
pub mod set;
#[cfg(any(test, feature = "test-utils"))]
pub mod tests_utils;
pub mod utils;

pub extern crate inventory;

pub use class::{ClassInfo, ClassRegistry, PROPERTY_SET_CLASS};
pub use config::PropsConfig;
pub use declaration::{Declaration, Declarations, PropertyType};
pub use property::{DynProperty, NameAware, OwnerAware, OwnerRef, PropertyOwner, base::Property};
pub use registry::TypeRegistry;
pub use set::{PropertyMap, PropertySet, PropertySetDecl, PropertySlot, SetState};
pub use utils::error::{PropError, PropResult};

#[cfg(feature = "derive")]
pub use propset_derive::Property;
