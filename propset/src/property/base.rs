use crate::property::{DynProperty, NameAware, OwnerAware, OwnerRef};

/// A named property object with a known owner.
///
/// Can be declared as-is, or embedded in a richer property type and delegated
/// to with `#[derive(Property)]` and a `#[property(base)]` field.
#[derive(Debug, Clone, Default)]
pub struct Property {
    name: Option<String>,
    owner: Option<OwnerRef>,
}

impl Property {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NameAware for Property {
    fn property_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_property_name(&mut self, name: String) {
        self.name = Some(name);
    }
}

impl OwnerAware for Property {
    fn property_owner(&self) -> Option<&OwnerRef> {
        self.owner.as_ref()
    }

    fn set_property_owner(&mut self, owner: OwnerRef) {
        self.owner = Some(owner);
    }
}

impl DynProperty for Property {
    fn as_name_aware(&self) -> Option<&dyn NameAware> {
        Some(self)
    }

    fn as_name_aware_mut(&mut self) -> Option<&mut dyn NameAware> {
        Some(self)
    }

    fn as_owner_aware(&self) -> Option<&dyn OwnerAware> {
        Some(self)
    }

    fn as_owner_aware_mut(&mut self) -> Option<&mut dyn OwnerAware> {
        Some(self)
    }
}
