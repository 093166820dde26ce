use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use propset::{
    Declarations, DynProperty, NameAware, OwnerAware, OwnerRef, PropError, PropResult, Property,
    PropertyMap, PropertySet, PropertySetDecl, declare_properties,
};

#[derive(Debug, Default, Property)]
struct Column {
    #[property(base)]
    base: Property,
    required: bool,
    default: Option<String>,
}

#[derive(Debug, Default, Property)]
struct Length(#[property(base)] Property, usize);

/// Name aware only, implemented by hand.
#[derive(Debug, Default, Property)]
#[property(name_aware)]
struct Label {
    name: Option<String>,
}

impl NameAware for Label {
    fn property_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_property_name(&mut self, name: String) {
        self.name = Some(name);
    }
}

/// Owner aware only, implemented by hand.
#[derive(Debug, Default, Property)]
#[property(owner_aware)]
struct Backref {
    owner: Option<OwnerRef>,
}

impl OwnerAware for Backref {
    fn property_owner(&self) -> Option<&OwnerRef> {
        self.owner.as_ref()
    }

    fn set_property_owner(&mut self, owner: OwnerRef) {
        self.owner = Some(owner);
    }
}

#[derive(Debug, Default, Property)]
struct Opaque;

#[derive(Debug, Default)]
struct Accounts {
    initialized: AtomicUsize,
}

impl PropertySetDecl for Accounts {
    fn declarations() -> PropResult<Declarations> {
        declare_properties! {
            id: Column,
            first_name: Column,
            last_name: Column,
            balance: Column,
        }
    }

    fn class_name() -> &'static str {
        "bank::Accounts"
    }

    fn init(&self, properties: &PropertyMap) -> PropResult<()> {
        self.initialized.fetch_add(1, Ordering::SeqCst);

        properties.write::<Column>("id")?.required = true;
        let mut balance = properties.write::<Column>("balance")?;
        balance.required = true;
        balance.default = Some("0".to_string());
        Ok(())
    }
}

#[test]
fn account_table_end_to_end() {
    let accounts = PropertySet::new(Accounts::default());
    assert!(!accounts.is_initialized());

    let properties = accounts.properties().expect("accounts declare properties");
    assert_eq!(
        properties.keys().collect::<Vec<_>>(),
        vec!["id", "first_name", "last_name", "balance"]
    );
    assert!(properties.iter().all(|slot| slot.is::<Column>()));

    for slot in properties {
        let column = slot.downcast_ref::<Column>().unwrap();
        assert_eq!(column.property_name(), Some(slot.name()));
        assert!(column.property_owner().unwrap().is(&accounts));
    }

    assert!(accounts.read::<Column>("id").unwrap().required);
    assert!(!accounts.read::<Column>("first_name").unwrap().required);
    assert_eq!(
        accounts.read::<Column>("balance").unwrap().default.as_deref(),
        Some("0")
    );

    let err = accounts.set("id", Column::default()).unwrap_err();
    assert!(matches!(
        &err,
        PropError::ReadOnlyProperty { class, name } if class == "bank::Accounts" && name == "id"
    ));
    assert!(accounts.read::<Column>("id").unwrap().required);
}

#[test]
fn init_hook_runs_once() {
    let accounts = PropertySet::new(Accounts::default());
    accounts.init().unwrap();
    accounts.init().unwrap();
    accounts.properties().unwrap();
    accounts.get("id").unwrap();

    assert_eq!(accounts.initialized.load(Ordering::SeqCst), 1);
}

#[test]
fn sets_of_the_same_type_are_independent() {
    let first = PropertySet::new(Accounts::default());
    let second = PropertySet::new(Accounts::default());

    first.write::<Column>("first_name").unwrap().required = true;
    assert!(!second.read::<Column>("first_name").unwrap().required);

    let owner = second.get("first_name").unwrap().property_owner().unwrap();
    assert!(owner.is(&second));
    assert!(!owner.is(&first));
}

struct Mixed;

impl PropertySetDecl for Mixed {
    fn declarations() -> PropResult<Declarations> {
        declare_properties! {
            length: Length,
            label: Label,
            backref: Backref,
            opaque: Opaque,
        }
    }
}

#[test]
fn capabilities_are_injected_independently() {
    let mixed = PropertySet::new(Mixed);

    let length = mixed.get("length").unwrap();
    assert_eq!(length.property_name().as_deref(), Some("length"));
    assert!(length.property_owner().is_some());

    let label = mixed.get("label").unwrap();
    assert_eq!(label.property_name().as_deref(), Some("label"));
    assert!(label.property_owner().is_none());

    let backref = mixed.get("backref").unwrap();
    assert_eq!(backref.property_name(), None);
    let owner = backref.property_owner().unwrap();
    assert!(Arc::ptr_eq(&owner.downcast::<PropertySet<Mixed>>().unwrap(), &mixed));

    let opaque = mixed.get("opaque").unwrap();
    assert!(opaque.property_name().is_none());
    assert!(opaque.property_owner().is_none());
    assert!(opaque.read().as_name_aware().is_none());
}

struct Nothing;

impl PropertySetDecl for Nothing {
    fn declarations() -> PropResult<Declarations> {
        declare_properties! {}
    }
}

#[test]
fn a_set_without_declarations_cannot_be_used() {
    let nothing = PropertySet::new(Nothing);
    assert!(nothing.properties().unwrap_err().is_no_declarations());
    assert!(nothing.init().unwrap_err().is_no_declarations());
    assert!(nothing.state().is_uninitialized());
}

struct Twice;

impl PropertySetDecl for Twice {
    fn declarations() -> PropResult<Declarations> {
        declare_properties! {
            id: Column,
            id: Length,
        }
    }
}

#[test]
fn repeated_names_are_rejected() {
    let twice = PropertySet::new(Twice);
    assert!(twice.properties().unwrap_err().is_duplicated_key());
}

#[test]
fn undeclared_names_are_errors() {
    let accounts = PropertySet::new(Accounts::default());
    let err = accounts.get("email").unwrap_err();
    assert!(matches!(
        err,
        PropError::UndeclaredProperty { ref name, .. } if name == "email"
    ));
    assert_eq!(accounts.properties().unwrap().len(), 4);
}

#[test]
fn slots_expose_the_instance_as_a_trait_object() {
    let accounts = PropertySet::new(Accounts::default());
    let slot = accounts.get("last_name").unwrap();

    let guard = slot.read();
    let property: &dyn DynProperty = &*guard;
    assert!(property.is::<Column>());
    assert!(!property.is::<Length>());
    drop(guard);

    slot.write()
        .downcast_mut::<Column>()
        .unwrap()
        .required = true;
    assert!(slot.is::<Column>());
    assert_eq!(slot.property_name().as_deref(), Some("last_name"));
    assert!(accounts.read::<Column>("last_name").unwrap().required);
}
