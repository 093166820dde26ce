//! The property set engine.
//!
//! A [`PropertySet`] wraps a consumer value implementing [`PropertySetDecl`].
//! The first time its properties are needed, the set builds one instance per
//! declared property, injects name and owner into the instances that accept
//! them, runs the [`PropertySetDecl::init`] hook and freezes the resulting
//! [`PropertyMap`]. The map is built at most once per set and never rebuilt.
//!
//! ```ignore
//! struct AccountTable;
//!
//! impl PropertySetDecl for AccountTable {
//!     fn declarations() -> PropResult<Declarations> {
//!         declare_properties! { id: IntColumn, balance: IntColumn }
//!     }
//! }
//!
//! let account = PropertySet::new(AccountTable);
//! assert_eq!(account.get("id")?.property_name().as_deref(), Some("id"));
//! ```

use std::{
    any::TypeId,
    collections::HashMap,
    fmt,
    ops::Deref,
    sync::{Arc, Weak},
};

use dashmap::DashMap;
use log::{debug, trace, warn};
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use strum::EnumIs;

use crate::{
    declaration::{Declaration, Declarations},
    property::{DynProperty, OwnerRef, PropertyOwner},
    utils::error::{PropError, PropResult},
};

/// Describes a concrete kind of property set.
///
/// This plays the role of a subclass: it supplies the declarations and may
/// customize how properties are created and post-processed. Overrides can fall
/// back to the default behavior through [`create_properties`] and
/// [`create_property`].
pub trait PropertySetDecl: Sized + Send + Sync + 'static {
    /// Ordered (name, type) table of this kind of set.
    ///
    /// Called at most once per type while it succeeds: the result is cached and
    /// shared by every set of this type.
    fn declarations() -> PropResult<Declarations>;

    fn class_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Build the property map from `declarations`.
    fn create_properties(
        &self,
        owner: &OwnerRef,
        declarations: &Declarations,
    ) -> PropResult<PropertyMap> {
        create_properties(self, owner, declarations)
    }

    /// Build one property instance.
    fn create_property(
        &self,
        owner: &OwnerRef,
        declaration: &Declaration,
    ) -> PropResult<Box<dyn DynProperty>> {
        create_property(owner, declaration)
    }

    /// Post-construction hook, run once after the map is built and before it is
    /// published.
    ///
    /// Must not access the owning [`PropertySet`]; use `properties` instead.
    fn init(&self, properties: &PropertyMap) -> PropResult<()> {
        let _ = properties;
        Ok(())
    }
}

/// Default implementation of [`PropertySetDecl::create_properties`].
pub fn create_properties<D: PropertySetDecl>(
    decl: &D,
    owner: &OwnerRef,
    declarations: &Declarations,
) -> PropResult<PropertyMap> {
    if declarations.is_empty() {
        return Err(PropError::NoDeclarations {
            class: D::class_name().to_string(),
        });
    }

    let mut properties = PropertyMap::with_capacity(D::class_name(), declarations.len());
    for declaration in declarations {
        let property = decl.create_property(owner, declaration)?;
        properties.insert(declaration.name(), declaration.ty().name(), property)?;
    }

    Ok(properties)
}

/// Default implementation of [`PropertySetDecl::create_property`].
///
/// Constructs the declared type and injects the name and owner capabilities
/// when the instance supports them.
pub fn create_property(
    owner: &OwnerRef,
    declaration: &Declaration,
) -> PropResult<Box<dyn DynProperty>> {
    let ty = declaration.ty();
    let mut property = ty.construct(declaration.name())?;

    if let Some(named) = property.as_name_aware_mut() {
        named.set_property_name(declaration.name().to_string());
    }
    if let Some(owned) = property.as_owner_aware_mut() {
        owned.set_property_owner(owner.clone());
    }

    trace!("Constructed property '{}' of type '{}'", declaration.name(), ty.name());
    Ok(property)
}

/// One entry of a [`PropertyMap`].
pub struct PropertySlot {
    name: String,
    type_name: &'static str,
    value: RwLock<Box<dyn DynProperty>>,
}

impl PropertySlot {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully-qualified name of the declared type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: DynProperty>(&self) -> bool {
        self.value.read().is::<T>()
    }

    /// Shared guard on the instance.
    pub fn read(&self) -> MappedRwLockReadGuard<'_, dyn DynProperty> {
        RwLockReadGuard::map(self.value.read(), |property| &**property)
    }

    /// Exclusive guard on the instance.
    ///
    /// The guard reaches the instance, not the slot: the entry itself cannot be
    /// replaced.
    pub fn write(&self) -> MappedRwLockWriteGuard<'_, dyn DynProperty> {
        RwLockWriteGuard::map(self.value.write(), |property| &mut **property)
    }

    /// Read guard on the instance as a `T`, `None` if it is something else.
    pub fn downcast_ref<T: DynProperty>(&self) -> Option<MappedRwLockReadGuard<'_, T>> {
        RwLockReadGuard::try_map(self.value.read(), |property| property.downcast_ref::<T>()).ok()
    }

    /// Write guard on the instance as a `T`, `None` if it is something else.
    pub fn downcast_mut<T: DynProperty>(&self) -> Option<MappedRwLockWriteGuard<'_, T>> {
        RwLockWriteGuard::try_map(self.value.write(), |property| property.downcast_mut::<T>()).ok()
    }

    /// Injected name, `None` if the instance is not name aware.
    pub fn property_name(&self) -> Option<String> {
        let property = self.value.read();
        property
            .as_name_aware()
            .and_then(|named| named.property_name())
            .map(str::to_string)
    }

    /// Injected owner, `None` if the instance is not owner aware.
    pub fn property_owner(&self) -> Option<OwnerRef> {
        let property = self.value.read();
        property
            .as_owner_aware()
            .and_then(|owned| owned.property_owner())
            .cloned()
    }
}

impl fmt::Debug for PropertySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySlot")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Ordered mapping from property name to property instance.
///
/// Iteration follows insertion order, which for a built set is declaration
/// order. Once published by a [`PropertySet`] it is only reachable through
/// shared references and cannot gain or lose entries.
pub struct PropertyMap {
    class: &'static str,
    slots: Vec<PropertySlot>,
    index: HashMap<String, usize>,
}

impl PropertyMap {
    pub fn new(class: &'static str) -> Self {
        Self::with_capacity(class, 0)
    }

    pub fn with_capacity(class: &'static str, capacity: usize) -> Self {
        Self {
            class,
            slots: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Append an entry. Fails with [`PropError::DuplicatedKey`] if `name` is taken.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        type_name: &'static str,
        property: Box<dyn DynProperty>,
    ) -> PropResult<()> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(PropError::DuplicatedKey {
                key: name,
                context: format!("property of '{}'", self.class),
            });
        }

        self.index.insert(name.clone(), self.slots.len());
        self.slots.push(PropertySlot {
            name,
            type_name,
            value: RwLock::new(property),
        });
        Ok(())
    }

    /// Class the map was built for.
    pub fn class(&self) -> &'static str {
        self.class
    }

    pub fn get(&self, name: &str) -> Option<&PropertySlot> {
        self.index.get(name).map(|&index| &self.slots[index])
    }

    /// Like [`Self::get`], failing with [`PropError::UndeclaredProperty`].
    pub fn slot(&self, name: &str) -> PropResult<&PropertySlot> {
        self.get(name).ok_or_else(|| PropError::UndeclaredProperty {
            class: self.class.to_string(),
            name: name.to_string(),
        })
    }

    pub fn read<T: DynProperty>(&self, name: &str) -> PropResult<MappedRwLockReadGuard<'_, T>> {
        let slot = self.slot(name)?;
        slot.downcast_ref::<T>()
            .ok_or_else(|| self.mismatch::<T>(slot))
    }

    pub fn write<T: DynProperty>(&self, name: &str) -> PropResult<MappedRwLockWriteGuard<'_, T>> {
        let slot = self.slot(name)?;
        slot.downcast_mut::<T>()
            .ok_or_else(|| self.mismatch::<T>(slot))
    }

    fn mismatch<T>(&self, slot: &PropertySlot) -> PropError {
        PropError::PropertyTypeMismatch {
            class: self.class.to_string(),
            name: slot.name.clone(),
            expected: std::any::type_name::<T>(),
            actual: slot.type_name,
        }
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(PropertySlot::name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PropertySlot> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<'a> IntoIterator for &'a PropertyMap {
    type Item = &'a PropertySlot;
    type IntoIter = std::slice::Iter<'a, PropertySlot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}

impl fmt::Debug for PropertyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMap")
            .field("class", &self.class)
            .field("properties", &self.slots)
            .finish()
    }
}

/// Declaration tables, shared by every set of the same type.
static DECLARATION_CACHE: Lazy<DashMap<TypeId, Arc<Declarations>>> = Lazy::new(DashMap::new);

fn cached_declarations<D: PropertySetDecl>() -> PropResult<Arc<Declarations>> {
    let key = TypeId::of::<D>();
    if let Some(declarations) = DECLARATION_CACHE.get(&key) {
        return Ok(Arc::clone(declarations.value()));
    }

    let declarations = Arc::new(D::declarations()?);
    debug!(
        "Caching {} property declarations for '{}'",
        declarations.len(),
        D::class_name()
    );
    Ok(Arc::clone(
        DECLARATION_CACHE.entry(key).or_insert(declarations).value(),
    ))
}

/// Initialization state of a [`PropertySet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIs)]
pub enum SetState {
    Uninitialized,
    Initialized,
}

/// A lazily built, cached set of named property objects.
///
/// Properties are read through [`Self::get`], [`Self::read`] and
/// [`Self::properties`]; writing through the set is always rejected with
/// [`PropError::ReadOnlyProperty`]. Property instances may still be mutated
/// through their own API, using [`Self::write`].
pub struct PropertySet<D: PropertySetDecl> {
    this: Weak<Self>,
    properties: OnceCell<PropertyMap>,
    decl: D,
}

impl<D: PropertySetDecl> PropertySet<D> {
    pub fn new(decl: D) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            properties: OnceCell::new(),
            decl,
        })
    }

    /// Reference handed to owner-aware properties of this set.
    pub fn owner_ref(&self) -> OwnerRef {
        let this: Weak<dyn PropertyOwner> = self.this.clone();
        OwnerRef::new(this)
    }

    pub fn decl(&self) -> &D {
        &self.decl
    }

    pub fn state(&self) -> SetState {
        if self.properties.get().is_some() {
            SetState::Initialized
        } else {
            SetState::Uninitialized
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state().is_initialized()
    }

    fn init_properties(&self) -> PropResult<&PropertyMap> {
        self.properties
            .get_or_try_init(|| {
                let declarations = cached_declarations::<D>()?;
                let properties = self
                    .decl
                    .create_properties(&self.owner_ref(), &declarations)?;
                self.decl.init(&properties)?;

                debug!(
                    "Initialized {} properties of '{}'",
                    properties.len(),
                    D::class_name()
                );
                Ok(properties)
            })
            .inspect_err(|err| warn!("Failed to initialize '{}': {err}", D::class_name()))
    }

    /// Build the properties if needed. Calling it again is a no-op.
    pub fn init(&self) -> PropResult<()> {
        self.init_properties().map(|_| ())
    }

    /// All properties, in declaration order. Always the same map.
    pub fn properties(&self) -> PropResult<&PropertyMap> {
        self.init_properties()
    }

    /// The property declared as `name`.
    pub fn get(&self, name: &str) -> PropResult<&PropertySlot> {
        self.init_properties()?.slot(name)
    }

    pub fn read<T: DynProperty>(&self, name: &str) -> PropResult<MappedRwLockReadGuard<'_, T>> {
        self.init_properties()?.read(name)
    }

    pub fn write<T: DynProperty>(&self, name: &str) -> PropResult<MappedRwLockWriteGuard<'_, T>> {
        self.init_properties()?.write(name)
    }

    /// Properties cannot be replaced through the set; this always fails.
    pub fn set<V>(&self, name: &str, value: V) -> PropResult<()> {
        drop(value);
        Err(PropError::ReadOnlyProperty {
            class: D::class_name().to_string(),
            name: name.to_string(),
        })
    }
}

impl<D: PropertySetDecl> Deref for PropertySet<D> {
    type Target = D;

    fn deref(&self) -> &Self::Target {
        &self.decl
    }
}

impl<D: PropertySetDecl> PropertyOwner for PropertySet<D> {
    fn class_name(&self) -> &'static str {
        D::class_name()
    }
}

impl<D: PropertySetDecl> fmt::Debug for PropertySet<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySet")
            .field("class", &D::class_name())
            .field("properties", &self.properties.get())
            .finish()
    }
}
