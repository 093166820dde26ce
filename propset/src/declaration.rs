//! Ordered (name, type) declaration tables.
//!
//! A [`Declarations`] table is the source of truth for which properties a set
//! holds. Order is significant: a set enumerates its properties in the order
//! they were declared.

use std::fmt;

use crate::{
    property::DynProperty,
    utils::error::{PropError, PropResult},
};

/// Zero-argument constructor of a property type.
pub type PropertyFactory = fn() -> PropResult<Box<dyn DynProperty>>;

/// Default factory for any `Default` property type.
pub fn construct<T: DynProperty + Default>() -> PropResult<Box<dyn DynProperty>> {
    Ok(Box::new(T::default()))
}

/// A constructible (or abstract) property type, identified by its fully-qualified name.
#[derive(Clone, Copy)]
pub struct PropertyType {
    name: &'static str,
    factory: Option<PropertyFactory>,
}

impl PropertyType {
    /// Property type named after the Rust type itself.
    pub fn of<T: DynProperty + Default>() -> Self {
        Self::named::<T>(std::any::type_name::<T>())
    }

    pub const fn named<T: DynProperty + Default>(name: &'static str) -> Self {
        Self {
            name,
            factory: Some(construct::<T> as PropertyFactory),
        }
    }

    pub const fn with_factory(name: &'static str, factory: PropertyFactory) -> Self {
        Self {
            name,
            factory: Some(factory),
        }
    }

    /// A type that can be named in declarations but never instantiated.
    pub const fn abstract_type(name: &'static str) -> Self {
        Self {
            name,
            factory: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn factory(&self) -> Option<PropertyFactory> {
        self.factory
    }

    pub fn is_abstract(&self) -> bool {
        self.factory.is_none()
    }

    /// Build an instance for the property declared as `property`.
    ///
    /// Fails with [`PropError::Construction`] if the type is abstract or its
    /// factory fails.
    pub fn construct(&self, property: &str) -> PropResult<Box<dyn DynProperty>> {
        let construction_error = |reason: String| PropError::Construction {
            property: property.to_string(),
            ty: self.name.to_string(),
            reason,
        };

        let factory = self.factory.ok_or_else(|| {
            construction_error("abstract type has no zero-argument constructor".to_string())
        })?;
        factory().map_err(|err| construction_error(err.to_string()))
    }
}

impl PartialEq for PropertyType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for PropertyType {}

impl fmt::Debug for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyType")
            .field("name", &self.name)
            .field("abstract", &self.is_abstract())
            .finish()
    }
}

/// One declared property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    name: String,
    ty: PropertyType,
}

impl Declaration {
    pub fn new(name: impl Into<String>, ty: PropertyType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &PropertyType {
        &self.ty
    }
}

/// Ordered list of declarations with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declarations {
    entries: Vec<Declaration>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a declaration. Fails with [`PropError::DuplicatedKey`] if `name`
    /// is already declared.
    pub fn push(&mut self, name: impl Into<String>, ty: PropertyType) -> PropResult<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(PropError::DuplicatedKey {
                key: name,
                context: "property".to_string(),
            });
        }

        self.entries.push(Declaration::new(name, ty));
        Ok(())
    }

    /// Builder-style [`Self::push`] of a `Default` property type.
    pub fn with<T: DynProperty + Default>(mut self, name: impl Into<String>) -> PropResult<Self> {
        self.push(name, PropertyType::of::<T>())?;
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|decl| decl.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.entries.iter().find(|decl| decl.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Declaration> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(Declaration::name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Declarations {
    type Item = &'a Declaration;
    type IntoIter = std::slice::Iter<'a, Declaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl TryFrom<Vec<(String, PropertyType)>> for Declarations {
    type Error = PropError;

    fn try_from(value: Vec<(String, PropertyType)>) -> PropResult<Self> {
        let mut declarations = Declarations::new();
        for (name, ty) in value {
            declarations.push(name, ty)?;
        }
        Ok(declarations)
    }
}

/// Build a [`Declarations`] table from `name: Type` pairs, in order.
///
/// Expands to a `PropResult<Declarations>`; a repeated name yields
/// [`PropError::DuplicatedKey`].
///
/// ```ignore
/// fn declarations() -> PropResult<Declarations> {
///     declare_properties! {
///         id: IntColumn,
///         first_name: VarCharColumn,
///     }
/// }
/// ```
#[macro_export]
macro_rules! declare_properties {
    (
        $( $name:ident : $ty:ty ),*
        $(,)?
    ) => {
        (|| -> $crate::utils::error::PropResult<$crate::declaration::Declarations> {
            #[allow(unused_mut)]
            let mut declarations = $crate::declaration::Declarations::new();
            $(
                declarations.push(
                    stringify!($name),
                    $crate::declaration::PropertyType::of::<$ty>(),
                )?;
            )*
            Ok(declarations)
        })()
    };
}
