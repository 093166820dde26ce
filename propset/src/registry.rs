//! Type constructor registry.
//!
//! Annotated classes name their property types as strings; the registry maps
//! those fully-qualified names to [`PropertyType`]s. Types are registered
//! statically with [`crate::register_property_type!`] or inserted at runtime.

use std::collections::{BTreeMap, btree_map::Entry};

use log::{debug, warn};
use once_cell::sync::Lazy;

use crate::{
    declaration::PropertyType,
    utils::error::{PropError, PropResult},
};

/// Inventory containing property type registrations.
pub struct PropertyTypeRegistration {
    pub ty: PropertyType,
}
inventory::collect!(PropertyTypeRegistration);

/// Register a property type under a fully-qualified name.
///
/// ```ignore
/// register_property_type!(IntColumn as "app::columns::IntColumn");
/// register_property_type!(abstract "app::columns::Column");
/// ```
#[macro_export]
macro_rules! register_property_type {
    (abstract $name:literal) => {
        $crate::inventory::submit! {
            $crate::registry::PropertyTypeRegistration {
                ty: $crate::declaration::PropertyType::abstract_type($name),
            }
        }
    };
    (
        $ty:ty as $name:literal
    ) => {
        $crate::inventory::submit! {
            $crate::registry::PropertyTypeRegistration {
                ty: $crate::declaration::PropertyType::named::<$ty>($name),
            }
        }
    };
}

static GLOBAL_REGISTRY: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::from_inventory);

/// Lookup table from fully-qualified type names to property types.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<&'static str, PropertyType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every statically registered property type.
    ///
    /// Built once, on first use.
    pub fn global() -> &'static TypeRegistry {
        &GLOBAL_REGISTRY
    }

    /// Collect all [`PropertyTypeRegistration`]s. When two registrations share a
    /// name the first one seen wins.
    pub fn from_inventory() -> Self {
        let mut registry = Self::new();
        for registration in inventory::iter::<PropertyTypeRegistration> {
            if let Err(err) = registry.insert(registration.ty) {
                warn!("Ignoring property type registration: {err}");
            }
        }

        debug!(
            "Collected {} property type registrations",
            registry.types.len()
        );
        registry
    }

    /// Adds a property type. Fails with [`PropError::DuplicatedKey`] if the name
    /// is taken.
    pub fn insert(&mut self, ty: PropertyType) -> PropResult<()> {
        match self.types.entry(ty.name()) {
            Entry::Occupied(_) => Err(PropError::DuplicatedKey {
                key: ty.name().to_string(),
                context: "property type".to_string(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(ty);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropertyType> {
        self.types.get(name)
    }

    /// Like [`Self::get`], failing with [`PropError::TypeResolution`].
    ///
    /// `class` and `declared` only describe where `name` came from.
    pub fn resolve(&self, class: &str, declared: &str, name: &str) -> PropResult<PropertyType> {
        self.get(name)
            .copied()
            .ok_or_else(|| PropError::TypeResolution {
                class: class.to_string(),
                declared: declared.to_string(),
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
