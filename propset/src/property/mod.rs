//! Property capabilities.
//!
//! A property type declared in a [`crate::set::PropertySet`] may opt in to two
//! independent capabilities:
//!
//! - [`NameAware`]: receives the key it was declared under.
//! - [`OwnerAware`]: receives a non-owning reference to the set that created it.
//!
//! The engine only sees properties as `Box<dyn DynProperty>`; capabilities are
//! discovered through the probe methods of [`DynProperty`], which return `None`
//! unless the implementor overrides them. `#[derive(Property)]` writes those
//! overrides for you.

use std::{
    fmt,
    sync::{Arc, Weak},
};

use downcast_rs::{DowncastSync, impl_downcast};

use crate::utils::ref_id::WeakRefId;

pub mod base;

/// Property types used in a property set are made aware of their own name
/// if they implement this trait.
pub trait NameAware {
    /// Name under which the property was declared, `None` before injection.
    fn property_name(&self) -> Option<&str>;

    fn set_property_name(&mut self, name: String);
}

/// Property types used in a property set are made aware of their owner
/// if they implement this trait.
pub trait OwnerAware {
    fn property_owner(&self) -> Option<&OwnerRef>;

    fn set_property_owner(&mut self, owner: OwnerRef);
}

/// Type-erased property instance as stored by a property set.
pub trait DynProperty: DowncastSync {
    fn as_name_aware(&self) -> Option<&dyn NameAware> {
        None
    }

    fn as_name_aware_mut(&mut self) -> Option<&mut dyn NameAware> {
        None
    }

    fn as_owner_aware(&self) -> Option<&dyn OwnerAware> {
        None
    }

    fn as_owner_aware_mut(&mut self) -> Option<&mut dyn OwnerAware> {
        None
    }
}
impl_downcast!(sync DynProperty);

/// Anything that can own properties. Implemented by every
/// [`crate::set::PropertySet`].
pub trait PropertyOwner: DowncastSync {
    fn class_name(&self) -> &'static str;
}
impl_downcast!(sync PropertyOwner);

/// Back-reference from a property to the set that created it.
///
/// Holds a [`Weak`] pointer: a property never keeps its owner alive. Equality
/// and hashing use the identity of the owner, not its contents.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OwnerRef(WeakRefId<dyn PropertyOwner>);

impl OwnerRef {
    pub fn new(owner: Weak<dyn PropertyOwner>) -> Self {
        Self(WeakRefId::new(owner))
    }

    pub fn upgrade(&self) -> Option<Arc<dyn PropertyOwner>> {
        self.0.upgrade()
    }

    /// Upgrade and downcast the owner to its concrete type.
    ///
    /// Returns `None` if the owner was dropped or is not a `T`.
    pub fn downcast<T: PropertyOwner>(&self) -> Option<Arc<T>> {
        self.upgrade()?.downcast_arc::<T>().ok()
    }

    /// Returns `true` if `owner` is the set this reference points at.
    pub fn is<T: ?Sized>(&self, owner: &Arc<T>) -> bool {
        self.0.is(owner)
    }

    /// Class name of the owner, `None` once it has been dropped.
    pub fn class_name(&self) -> Option<&'static str> {
        self.upgrade().map(|owner| owner.class_name())
    }
}

impl fmt::Debug for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class_name() {
            Some(class) => write!(f, "OwnerRef({class})"),
            None => f.write_str("OwnerRef(<dropped>)"),
        }
    }
}
