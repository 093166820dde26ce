//! Annotated classes.
//!
//! A class is a named description of a property set: its parent class, the
//! namespace and imports its type names are resolved against, and a doc block
//! of `@property` annotations (see [`crate::docblock`]). Classes are registered
//! statically with [`crate::register_class!`] or inserted into a
//! [`ClassRegistry`] at runtime.
//!
//! Only classes whose parent chain reaches [`PROPERTY_SET_CLASS`] can produce
//! declarations.

use std::collections::{BTreeMap, BTreeSet, btree_map::Entry};

use log::{debug, trace, warn};
use once_cell::sync::Lazy;

use crate::{
    config::PropsConfig,
    declaration::Declarations,
    docblock::{ResolutionContext, parse_annotations},
    registry::TypeRegistry,
    utils::error::{PropError, PropResult},
};

/// Name of the root class every annotated property set derives from.
pub const PROPERTY_SET_CLASS: &str = "propset::PropertySet";

/// Inventory containing class registrations.
pub struct ClassRegistration {
    pub name: &'static str,
    pub parent: Option<&'static str>,
    pub namespace: &'static str,
    pub imports: &'static [(&'static str, &'static str)],
    pub doc: &'static str,
}
inventory::collect!(ClassRegistration);

/// Register an annotated class.
///
/// ```ignore
/// register_class! {
///     name: "app::AccountTable",
///     parent: "app::Table",
///     namespace: "app",
///     imports: ["cols" => "app::columns"],
///     doc: r"
///         @property cols::IntColumn $id
///         @property cols::VarCharColumn $first_name
///     ",
/// }
/// ```
#[macro_export]
macro_rules! register_class {
    (
        name: $name:expr,
        parent: $parent:expr,
        namespace: $namespace:expr,
        $( imports: [ $( $alias:literal => $target:literal ),* $(,)? ], )?
        doc: $doc:expr
        $(,)?
    ) => {
        $crate::inventory::submit! {
            $crate::class::ClassRegistration {
                name: $name,
                parent: Some($parent),
                namespace: $namespace,
                imports: &[ $( $( ($alias, $target), )* )? ],
                doc: $doc,
            }
        }
    };
}

/// Runtime description of an annotated class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    name: String,
    parent: Option<String>,
    context: ResolutionContext,
    doc: String,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            context: ResolutionContext::default(),
            doc: String::new(),
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.context = self.context.with_namespace(namespace);
        self
    }

    pub fn with_import(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.context = self.context.with_import(alias, target);
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn context(&self) -> &ResolutionContext {
        &self.context
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }
}

impl From<&ClassRegistration> for ClassInfo {
    fn from(registration: &ClassRegistration) -> Self {
        let mut info = ClassInfo::new(registration.name)
            .in_namespace(registration.namespace)
            .with_doc(registration.doc);
        if let Some(parent) = registration.parent {
            info = info.extends(parent);
        }
        for (alias, target) in registration.imports {
            info = info.with_import(*alias, *target);
        }
        info
    }
}

static GLOBAL_CLASSES: Lazy<ClassRegistry> = Lazy::new(ClassRegistry::from_inventory);

/// Registry of annotated classes, indexed by name.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: BTreeMap<String, ClassInfo>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every statically registered class. Built once, on first use.
    pub fn global() -> &'static ClassRegistry {
        &GLOBAL_CLASSES
    }

    /// Collect all [`ClassRegistration`]s. When two registrations share a name
    /// the first one seen wins.
    pub fn from_inventory() -> Self {
        let mut registry = Self::new();
        for registration in inventory::iter::<ClassRegistration> {
            if let Err(err) = registry.insert(ClassInfo::from(registration)) {
                warn!("Ignoring class registration: {err}");
            }
        }

        debug!("Collected {} class registrations", registry.classes.len());
        registry
    }

    /// Adds a class. Fails with [`PropError::DuplicatedKey`] if the name is taken.
    pub fn insert(&mut self, class: ClassInfo) -> PropResult<()> {
        match self.classes.entry(class.name.clone()) {
            Entry::Occupied(_) => Err(PropError::DuplicatedKey {
                key: class.name,
                context: "class".to_string(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(class);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    /// Returns `true` if `ancestor` appears in the parent chain of `class`.
    ///
    /// A class is not its own subclass. Unregistered parents end the chain.
    pub fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool {
        let mut visited = BTreeSet::new();
        let mut current = self.get(class).and_then(ClassInfo::parent);

        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            if !visited.insert(parent) {
                warn!("Cyclic class hierarchy detected at '{parent}'");
                return false;
            }
            current = self.get(parent).and_then(ClassInfo::parent);
        }

        false
    }

    /// Build the declarations of `class` from its `@property` annotations.
    ///
    /// Type names are resolved in the class's context extended with `config`,
    /// then looked up in `types`.
    pub fn declarations(
        &self,
        class: &str,
        types: &TypeRegistry,
        config: &PropsConfig,
    ) -> PropResult<Declarations> {
        let info = self
            .get(class)
            .ok_or_else(|| PropError::ClassNotFound(class.to_string()))?;

        if !self.is_subclass_of(class, PROPERTY_SET_CLASS) {
            return Err(PropError::NotASubclass {
                class: class.to_string(),
                root: PROPERTY_SET_CLASS,
            });
        }

        let annotations = parse_annotations(class, &info.doc)?;
        if annotations.is_empty() {
            return Err(PropError::NoDeclarations {
                class: class.to_string(),
            });
        }

        let context = info.context.clone().with_config(config);
        let mut declarations = Declarations::new();
        for annotation in annotations {
            let resolved = context.resolve(&annotation.type_name);
            let ty = types.resolve(class, &annotation.type_name, &resolved)?;

            trace!(
                "{class}: ${} resolved '{}' to '{}'",
                annotation.name, annotation.type_name, resolved
            );
            declarations.push(annotation.name, ty)?;
        }

        debug!(
            "Resolved {} property declarations for class '{class}'",
            declarations.len()
        );
        Ok(declarations)
    }
}

impl Declarations {
    /// Declarations of a statically registered class, resolved against the
    /// global type registry and the class's own namespace and imports only.
    pub fn from_class(class: &str) -> PropResult<Self> {
        Self::from_class_with(class, &PropsConfig::default())
    }

    /// Like [`Self::from_class`], with the namespace fallback and aliases of
    /// `config`.
    pub fn from_class_with(class: &str, config: &PropsConfig) -> PropResult<Self> {
        ClassRegistry::global().declarations(class, TypeRegistry::global(), config)
    }
}
