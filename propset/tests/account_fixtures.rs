use propset::{
    NameAware, OwnerAware, PropertySet, PropertySetDecl,
    tests_utils::{AccountTable, IntColumn, VarCharColumn},
};

#[test]
fn account_table_fixture() {
    let account = PropertySet::new(AccountTable);

    let properties = account.properties().unwrap();
    assert_eq!(
        properties.keys().collect::<Vec<_>>(),
        vec!["id", "first_name", "last_name", "balance"]
    );
    assert_eq!(
        properties.get("first_name").unwrap().type_name(),
        std::any::type_name::<VarCharColumn>()
    );

    let id = account.read::<IntColumn>("id").unwrap();
    assert_eq!(id.property_name(), Some("id"));
    assert!(id.required);
    drop(id);

    let balance = account.read::<IntColumn>("balance").unwrap();
    assert!(balance.property_owner().unwrap().is(&account));
    assert_eq!(balance.default, Some(0));
    drop(balance);

    assert_eq!(account.read::<VarCharColumn>("first_name").unwrap().length, 64);
    assert_eq!(account.read::<VarCharColumn>("last_name").unwrap().ty, "VARCHAR");

    let err = account.set("id", "foo").unwrap_err();
    assert!(err.is_read_only_property());
    assert!(std::ptr::eq(properties, account.properties().unwrap()));
    assert_eq!(
        account.get("balance").unwrap().property_owner().unwrap().class_name(),
        Some(AccountTable::class_name())
    );
}

#[test]
fn fixture_columns_start_unbound() {
    let column = VarCharColumn::default();
    assert_eq!(column.length, 255);
    assert_eq!(column.property_name(), None);
    assert!(column.property_owner().is_none());
    assert_eq!(IntColumn::default().ty, "INT");
}
