//! `@property` annotations.
//!
//! Annotated classes describe their properties in a doc block, one annotation
//! per line:
//!
//! ```text
//! /**
//!  * @property IntColumn $id
//!  * @property-read columns::VarCharColumn $first_name the given name
//!  */
//! ```
//!
//! Leading whitespace, `/` and `*` are skipped; lines that do not start with
//! `@property` are ignored; anything after the property name is free text.
//! Type names are resolved to fully-qualified names by a [`ResolutionContext`].

use std::collections::BTreeMap;

use chumsky::prelude::*;

use crate::{
    config::PropsConfig,
    utils::error::{PropError, PropResult},
};

/// Access modifier of an annotation (`@property`, `@property-read`, `@property-write`).
///
/// Informational only: every declared property is read-only through its set
/// whatever the modifier says.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Access {
    #[default]
    ReadWrite,
    Read,
    Write,
}

/// A parsed `@property` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// 1-based line number inside the doc block.
    pub line: usize,
    pub access: Access,
    /// Type name as written, not yet resolved.
    pub type_name: String,
    pub name: String,
}

fn inline_whitespace<'src>()
-> impl Parser<'src, &'src str, (), extra::Err<Rich<'src, char>>> + Clone {
    any()
        .filter(|c: &char| *c == ' ' || *c == '\t')
        .repeated()
        .at_least(1)
        .ignored()
        .labelled("whitespace")
}

fn access_parser<'src>() -> impl Parser<'src, &'src str, Access, extra::Err<Rich<'src, char>>> + Clone
{
    choice((
        just("-read").to(Access::Read),
        just("-write").to(Access::Write),
    ))
    .or_not()
    .map(|access| access.unwrap_or_default())
    .labelled("access modifier")
}

fn word_char(c: &char) -> bool {
    c.is_alphanumeric() || *c == '_'
}

/// Path of word characters, `::` and `\`, with an optional `[]` suffix.
fn type_name_parser<'src>()
-> impl Parser<'src, &'src str, &'src str, extra::Err<Rich<'src, char>>> + Clone {
    any()
        .filter(|c: &char| word_char(c) || *c == ':' || *c == '\\')
        .repeated()
        .at_least(1)
        .then(just("[]").or_not())
        .to_slice()
        .labelled("type name")
}

fn property_name_parser<'src>()
-> impl Parser<'src, &'src str, &'src str, extra::Err<Rich<'src, char>>> + Clone {
    just('$')
        .ignore_then(any().filter(word_char).repeated().at_least(1).to_slice())
        .labelled("property name")
}

/// Parser for a single annotation, starting at `@property`.
pub fn annotation_parser<'src>()
-> impl Parser<'src, &'src str, (Access, &'src str, &'src str), extra::Err<Rich<'src, char>>> + Clone
{
    just("@property")
        .ignore_then(access_parser())
        .then_ignore(inline_whitespace())
        .then(type_name_parser())
        .then_ignore(inline_whitespace())
        .then(property_name_parser())
        .then_ignore(any().repeated())
        .map(|((access, type_name), name)| (access, type_name, name))
}

/// Strip the comment decoration of `line`, returning the annotation text if the
/// line holds a `@property` tag.
fn annotation_body(line: &str) -> Option<&str> {
    let body = line
        .trim_start()
        .trim_start_matches('/')
        .trim_start_matches('*')
        .trim_start();
    let rest = body.strip_prefix("@property")?;

    match rest.chars().next() {
        None => Some(body),
        Some(c) if c == '-' || c.is_whitespace() => Some(body),
        Some(_) => None,
    }
}

/// Parse every `@property` annotation of `doc`, in order.
///
/// `class` is only used to report errors.
pub fn parse_annotations(class: &str, doc: &str) -> PropResult<Vec<Annotation>> {
    let mut annotations = Vec::new();

    for (index, line) in doc.lines().enumerate() {
        let Some(body) = annotation_body(line) else {
            continue;
        };

        let (access, type_name, name) = annotation_parser()
            .parse(body)
            .into_result()
            .map_err(|errors| PropError::AnnotationParse {
                class: class.to_string(),
                line: index + 1,
                message: errors
                    .into_iter()
                    .map(|err| err.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            })?;

        annotations.push(Annotation {
            line: index + 1,
            access,
            type_name: type_name.to_string(),
            name: name.to_string(),
        });
    }

    Ok(annotations)
}

/// Scope in which the type names of a class's annotations are resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionContext {
    namespace: String,
    imports: BTreeMap<String, String>,
    aliases: BTreeMap<String, String>,
}

impl ResolutionContext {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self::default().with_namespace(namespace)
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = normalize_path(&namespace.into());
        self
    }

    /// Import `target` under `alias`; `alias::Rest` then resolves to `target::Rest`.
    pub fn with_import(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        let target = normalize_path(&target.into());
        self.imports.insert(
            alias.into(),
            target.trim_start_matches("::").to_string(),
        );
        self
    }

    /// Import `path` under its last segment.
    pub fn with_use(self, path: &str) -> Self {
        let path = normalize_path(path);
        let alias = path.rsplit("::").next().unwrap_or(&path).to_string();
        self.with_import(alias, path)
    }

    /// Add the global aliases of `config`, and its namespace if none is set.
    pub fn with_config(mut self, config: &PropsConfig) -> Self {
        if self.namespace.is_empty() {
            if let Some(namespace) = &config.namespace {
                self.namespace = normalize_path(namespace);
            }
        }

        for (alias, target) in &config.aliases {
            self.aliases
                .entry(alias.clone())
                .or_insert_with(|| normalize_path(target));
        }
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Resolve `name` to a fully-qualified type name.
    ///
    /// In order: a leading `::` makes the name absolute; a first segment naming
    /// an import is replaced by the import target; an exact global alias maps to
    /// its target; anything else is relative to the namespace.
    pub fn resolve(&self, name: &str) -> String {
        let name = normalize_path(name);

        if let Some(absolute) = name.strip_prefix("::") {
            return absolute.to_string();
        }

        let (head, tail) = match name.split_once("::") {
            Some((head, tail)) => (head, Some(tail)),
            None => (name.as_str(), None),
        };

        if let Some(target) = self.imports.get(head) {
            return match tail {
                Some(tail) => format!("{target}::{tail}"),
                None => target.clone(),
            };
        }

        if let Some(target) = self.aliases.get(&name) {
            return target.trim_start_matches("::").to_string();
        }

        if self.namespace.is_empty() {
            name
        } else {
            format!("{}::{}", self.namespace.trim_start_matches("::"), name)
        }
    }
}

/// Accept `\`-separated paths as well as `::`-separated ones.
fn normalize_path(path: &str) -> String {
    path.replace('\\', "::")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT_DOC: &str = r#"
        /**
         * Accounts of the bank.
         *
         * @property IntColumn $id
         * @property-read columns::VarCharColumn $first_name given name
         * @property-write \app\columns\VarCharColumn $last_name
         *   @property   Int    $balance
         * @see Table
         */
    "#;

    #[test]
    fn parses_annotations_in_order() {
        let annotations = parse_annotations("AccountTable", ACCOUNT_DOC).unwrap();

        let names: Vec<_> = annotations.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["id", "first_name", "last_name", "balance"]);

        assert_eq!(annotations[0].type_name, "IntColumn");
        assert_eq!(annotations[0].access, Access::ReadWrite);
        assert_eq!(annotations[1].type_name, "columns::VarCharColumn");
        assert_eq!(annotations[1].access, Access::Read);
        assert_eq!(annotations[2].type_name, "\\app\\columns\\VarCharColumn");
        assert_eq!(annotations[2].access, Access::Write);
        assert_eq!(annotations[3].type_name, "Int");
        assert_eq!(annotations[0].line, 5);
    }

    #[test]
    fn ignores_lines_without_annotations() {
        let doc = "/**\n * Just prose.\n * @properties are described elsewhere\n */";
        assert!(parse_annotations("Prose", doc).unwrap().is_empty());
        assert!(parse_annotations("Empty", "").unwrap().is_empty());
    }

    #[test]
    fn annotations_without_decoration() {
        let doc = "@property IntColumn $id\n@property IntColumn $balance";
        let annotations = parse_annotations("Plain", doc).unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[1].line, 2);
    }

    #[test]
    fn reports_malformed_annotations_with_line() {
        let doc = "/**\n * @property IntColumn $id\n * @property IntColumn id\n */";
        let err = parse_annotations("Broken", doc).unwrap_err();
        match err {
            PropError::AnnotationParse { class, line, .. } => {
                assert_eq!(class, "Broken");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error {other:?}"),
        }

        assert!(
            parse_annotations("Broken", " * @property $id")
                .unwrap_err()
                .is_annotation_parse()
        );
        assert!(
            parse_annotations("Broken", " * @property-readonly Int $id")
                .unwrap_err()
                .is_annotation_parse()
        );
    }

    #[test]
    fn accepts_list_types_and_numeric_names() {
        let doc = " * @property IntColumn[] $ids\n * @property-read lib\\Flag $2fa_enabled";
        let annotations = parse_annotations("Lists", doc).unwrap();

        assert_eq!(annotations[0].type_name, "IntColumn[]");
        assert_eq!(annotations[0].name, "ids");
        assert_eq!(annotations[1].type_name, "lib\\Flag");
        assert_eq!(annotations[1].name, "2fa_enabled");
        assert_eq!(annotations[1].access, Access::Read);

        assert!(
            parse_annotations("Lists", "@property IntColumn[ $ids")
                .unwrap_err()
                .is_annotation_parse()
        );
    }

    #[test]
    fn resolves_relative_to_namespace() {
        let ctx = ResolutionContext::new("app");
        assert_eq!(ctx.resolve("IntColumn"), "app::IntColumn");
        assert_eq!(ctx.resolve("columns::IntColumn"), "app::columns::IntColumn");
        assert_eq!(ctx.resolve("::lib::IntColumn"), "lib::IntColumn");
        assert_eq!(ctx.resolve("\\lib\\IntColumn"), "lib::IntColumn");

        assert_eq!(ResolutionContext::default().resolve("IntColumn"), "IntColumn");
    }

    #[test]
    fn resolves_imports_before_namespace() {
        let ctx = ResolutionContext::new("app")
            .with_use("lib::columns::IntColumn")
            .with_import("cols", "\\lib\\columns");

        assert_eq!(ctx.resolve("IntColumn"), "lib::columns::IntColumn");
        assert_eq!(ctx.resolve("cols::VarCharColumn"), "lib::columns::VarCharColumn");
        assert_eq!(ctx.resolve("cols"), "lib::columns");
        assert_eq!(ctx.resolve("Other"), "app::Other");
    }

    #[test]
    fn config_aliases_and_namespace() {
        let mut config = PropsConfig::default();
        config.namespace = Some("shop".to_string());
        config
            .aliases
            .insert("Money".to_string(), "shop::columns::MoneyColumn".to_string());

        let ctx = ResolutionContext::default().with_config(&config);
        assert_eq!(ctx.namespace(), "shop");
        assert_eq!(ctx.resolve("Money"), "shop::columns::MoneyColumn");
        assert_eq!(ctx.resolve("Other"), "shop::Other");

        let ctx = ResolutionContext::new("app")
            .with_import("Money", "bank::Money")
            .with_config(&config);
        assert_eq!(ctx.namespace(), "app");
        assert_eq!(ctx.resolve("Money"), "bank::Money");
    }
}
