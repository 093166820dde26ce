//! Fixtures shared by unit and integration tests.

use crate::{
    declare_properties,
    declaration::Declarations,
    property::base::Property,
    set::{PropertyMap, PropertySetDecl},
    utils::error::PropResult,
};

/// Integer column of a table.
#[derive(Debug, propset_derive::Property)]
pub struct IntColumn {
    #[property(base)]
    base: Property,
    pub ty: &'static str,
    pub required: bool,
    pub default: Option<i64>,
}

impl Default for IntColumn {
    fn default() -> Self {
        Self {
            base: Property::new(),
            ty: "INT",
            required: false,
            default: None,
        }
    }
}

/// Variable length string column of a table.
#[derive(Debug, propset_derive::Property)]
pub struct VarCharColumn {
    #[property(base)]
    base: Property,
    pub ty: &'static str,
    pub required: bool,
    pub length: usize,
}

impl Default for VarCharColumn {
    fn default() -> Self {
        Self {
            base: Property::new(),
            ty: "VARCHAR",
            required: false,
            length: 255,
        }
    }
}

/// Table of bank accounts.
///
/// `id` and `balance` are required, `balance` defaults to zero and both names
/// are limited to 64 characters.
#[derive(Debug, Default)]
pub struct AccountTable;

impl PropertySetDecl for AccountTable {
    fn declarations() -> PropResult<Declarations> {
        declare_properties! {
            id: IntColumn,
            first_name: VarCharColumn,
            last_name: VarCharColumn,
            balance: IntColumn,
        }
    }

    fn init(&self, properties: &PropertyMap) -> PropResult<()> {
        properties.write::<IntColumn>("id")?.required = true;
        properties.write::<VarCharColumn>("first_name")?.length = 64;
        properties.write::<VarCharColumn>("last_name")?.length = 64;

        let mut balance = properties.write::<IntColumn>("balance")?;
        balance.required = true;
        balance.default = Some(0);
        Ok(())
    }
}
