//! Column registry: names, synonyms and prefix factories.
//!
//! # Architecture
//!
//! Columns are registered under a canonical name plus any number of
//! synonyms, all matched case-insensitively. Names that no registered column
//! claims are offered to [`ColumnFactory`] functions in registration order;
//! a factory is consulted when the lowercased name starts with its prefix
//! (the empty prefix matches everything) and may build, register and return
//! a new column.
//!
//! The registry is shared by every request. Its tables sit behind a
//! [`RwLock`], so factories may register columns while other requests look
//! names up, and a column built for one request is reused by the next.
//!
//! # Example
//!
//! ```ignore
//! use paperlist_core::{ColumnErrors, ColumnRegistry};
//!
//! let registry = build_default_registry(settings);
//! let mut errors = ColumnErrors::new();
//! if let Some(column) = registry.lookup("tag:accept", &mut errors) {
//!     assert_eq!(column.name(), "tag:accept");
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use paperlist_formula::Formula;
use paperlist_model::ConferenceSettings;
use tracing::{debug, trace};

use crate::column::{ColumnMeta, ColumnState, PaperColumn, PrepareLevel};
use crate::columns::FormulaColumn;
use crate::context::ListContext;
use crate::error::{ColumnErrors, RegistryError};

/// What a factory is asked to build.
pub struct FactoryRequest<'a> {
    pub registry: &'a ColumnRegistry,
    /// The name as requested.
    pub name: &'a str,
    /// The name, lowercased.
    pub lname: &'a str,
    /// The prefix that matched.
    pub prefix: &'a str,
}

impl FactoryRequest<'_> {
    /// The name with the matched prefix removed.
    pub fn rest(&self) -> &str {
        self.name.get(self.prefix.len()..).unwrap_or_default()
    }

    pub fn settings(&self) -> &Arc<ConferenceSettings> {
        self.registry.settings()
    }
}

/// Builds a column for a name, or declines with `None`.
///
/// Factories report user-facing problems through `errors` and are expected
/// to register what they build so the next lookup finds it directly.
pub type ColumnFactory = fn(&FactoryRequest<'_>, &mut ColumnErrors) -> Option<Arc<dyn PaperColumn>>;

struct FactoryEntry {
    prefix: String,
    make: ColumnFactory,
    prototype: Option<Arc<dyn PaperColumn>>,
}

#[derive(Default)]
struct Tables {
    by_name: HashMap<String, Arc<dyn PaperColumn>>,
    /// Canonical names in registration order.
    order: Vec<String>,
    factories: Vec<FactoryEntry>,
    formulas: Vec<(Arc<Formula>, Arc<dyn PaperColumn>)>,
}

impl Tables {
    fn insert(
        &mut self,
        column: Arc<dyn PaperColumn>,
        synonyms: &[&str],
    ) -> Result<Arc<dyn PaperColumn>, RegistryError> {
        let mut names = vec![column.name().to_lowercase()];
        names.extend(synonyms.iter().map(|name| name.to_lowercase()));
        for (index, name) in names.iter().enumerate() {
            if self.by_name.contains_key(name) || names[..index].contains(name) {
                return Err(RegistryError::DuplicateName { name: name.clone() });
            }
        }
        self.order.push(names[0].clone());
        for name in names {
            self.by_name.insert(name, Arc::clone(&column));
        }
        Ok(column)
    }
}

/// Thread-safe table of listing columns.
pub struct ColumnRegistry {
    settings: Arc<ConferenceSettings>,
    tables: RwLock<Tables>,
}

impl std::fmt::Debug for ColumnRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.read();
        f.debug_struct("ColumnRegistry")
            .field("columns", &tables.order)
            .field("factories", &tables.factories.len())
            .finish_non_exhaustive()
    }
}

impl Default for ColumnRegistry {
    fn default() -> Self {
        Self::new(Arc::new(ConferenceSettings::default()))
    }
}

impl ColumnRegistry {
    /// Creates an empty registry for a conference.
    pub fn new(settings: Arc<ConferenceSettings>) -> Self {
        Self {
            settings,
            tables: RwLock::new(Tables::default()),
        }
    }

    pub fn settings(&self) -> &Arc<ConferenceSettings> {
        &self.settings
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a column under its own name and `synonyms`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if any of the names is taken;
    /// nothing is registered in that case.
    pub fn register(
        &self,
        column: impl PaperColumn + 'static,
        synonyms: &[&str],
    ) -> Result<Arc<dyn PaperColumn>, RegistryError> {
        self.register_arc(Arc::new(column), synonyms)
    }

    /// Registers an already shared column.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if any of the names is taken.
    pub fn register_arc(
        &self,
        column: Arc<dyn PaperColumn>,
        synonyms: &[&str],
    ) -> Result<Arc<dyn PaperColumn>, RegistryError> {
        let column = self.write().insert(column, synonyms)?;
        trace!(column = %column.name(), "registered column");
        Ok(column)
    }

    /// Registers `column` unless a column of the same name exists, returning
    /// whichever is registered afterwards.
    pub fn register_or_get(&self, column: Arc<dyn PaperColumn>) -> Arc<dyn PaperColumn> {
        let mut tables = self.write();
        let lname = column.name().to_lowercase();
        if let Some(existing) = tables.by_name.get(&lname) {
            return Arc::clone(existing);
        }
        tables.order.push(lname.clone());
        tables.by_name.insert(lname, Arc::clone(&column));
        debug!(column = %column.name(), "registered column on demand");
        column
    }

    /// Makes `new_name` another name for the column registered as `old_name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownSynonymTarget`] if `old_name` is not
    /// registered and [`RegistryError::DuplicateName`] if `new_name` is.
    pub fn register_synonym(&self, new_name: &str, old_name: &str) -> Result<(), RegistryError> {
        let mut tables = self.write();
        let target = tables
            .by_name
            .get(&old_name.to_lowercase())
            .cloned()
            .ok_or_else(|| RegistryError::UnknownSynonymTarget {
                name: old_name.to_string(),
            })?;
        let lname = new_name.to_lowercase();
        if tables.by_name.contains_key(&lname) {
            return Err(RegistryError::DuplicateName { name: lname });
        }
        tables.by_name.insert(lname, target);
        Ok(())
    }

    /// Adds a factory consulted for names starting with `prefix`.
    ///
    /// `prototype` stands for the factory's columns in completion.
    pub fn register_factory(
        &self,
        prefix: &str,
        make: ColumnFactory,
        prototype: Option<Arc<dyn PaperColumn>>,
    ) {
        self.write().factories.push(FactoryEntry {
            prefix: prefix.to_lowercase(),
            make,
            prototype,
        });
    }

    /// Finds a registered column by exact name, ignoring case.
    pub fn lookup_local(&self, name: &str) -> Option<Arc<dyn PaperColumn>> {
        self.read().by_name.get(&name.to_lowercase()).cloned()
    }

    /// Resolves a column name.
    ///
    /// An exact registered name wins; otherwise factories are tried in
    /// registration order and the first to build a column wins. Problems are
    /// reported through `errors`; an unknown name alone reports nothing.
    pub fn lookup(&self, name: &str, errors: &mut ColumnErrors) -> Option<Arc<dyn PaperColumn>> {
        let lname = name.to_lowercase();
        let candidates: Vec<(String, ColumnFactory)> = {
            let tables = self.read();
            if let Some(column) = tables.by_name.get(&lname) {
                return Some(Arc::clone(column));
            }
            tables
                .factories
                .iter()
                .filter(|factory| lname.starts_with(&factory.prefix))
                .map(|factory| (factory.prefix.clone(), factory.make))
                .collect()
        };
        for (prefix, make) in candidates {
            let request = FactoryRequest {
                registry: self,
                name,
                lname: &lname,
                prefix: &prefix,
            };
            if let Some(column) = make(&request, errors) {
                debug!(name, prefix = %prefix, column = %column.name(), "factory built column");
                return Some(column);
            }
        }
        None
    }

    /// Canonical columns in registration order.
    pub fn columns(&self) -> Vec<Arc<dyn PaperColumn>> {
        let tables = self.read();
        tables
            .order
            .iter()
            .filter_map(|name| tables.by_name.get(name).cloned())
            .collect()
    }

    pub fn metas(&self) -> Vec<ColumnMeta> {
        self.columns()
            .iter()
            .map(|column| column.meta().clone())
            .collect()
    }

    /// Finds a registered formula column by saved name or expression.
    pub fn find_formula(&self, name: &str) -> Option<Arc<dyn PaperColumn>> {
        self.read()
            .formulas
            .iter()
            .find(|(formula, _)| formula.matches_name(name))
            .map(|(_, column)| Arc::clone(column))
    }

    /// Registers a column for `formula`, or returns the one already
    /// registered for it.
    ///
    /// Saved formulas are named `formula<id>`; others are numbered
    /// `formulax<n>` in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if the generated name is
    /// taken by another column.
    pub fn register_formula(
        &self,
        formula: Arc<Formula>,
    ) -> Result<Arc<dyn PaperColumn>, RegistryError> {
        let mut tables = self.write();
        let existing = tables.formulas.iter().find(|(known, _)| {
            match (known.formula_id(), formula.formula_id()) {
                (Some(a), Some(b)) => a == b,
                (None, None) => known.expression() == formula.expression(),
                _ => false,
            }
        });
        if let Some((_, column)) = existing {
            return Ok(Arc::clone(column));
        }
        let name = match formula.formula_id() {
            Some(id) => format!("formula{id}"),
            None => format!("formulax{}", tables.formulas.len() + 1),
        };
        let column: Arc<dyn PaperColumn> =
            Arc::new(FormulaColumn::new(&name, Some(Arc::clone(&formula))));
        let column = tables.insert(column, &[])?;
        tables.formulas.push((formula, Arc::clone(&column)));
        debug!(column = %name, "registered formula column");
        Ok(column)
    }

    /// Names to offer when completing a column name for `ctx`'s viewer.
    ///
    /// Preparing at completion level may touch `ctx`; callers should pass a
    /// context used for nothing else.
    pub fn completion_names(&self, ctx: &mut ListContext) -> Vec<String> {
        let mut sources = self.columns();
        sources.extend(
            self.read()
                .factories
                .iter()
                .filter_map(|factory| factory.prototype.clone()),
        );
        let mut names: Vec<String> = Vec::new();
        for source in &sources {
            let instances = source
                .completion_instances(self)
                .unwrap_or_else(|| vec![Arc::clone(source)]);
            for column in instances {
                if !column.meta().is_completable() {
                    continue;
                }
                let mut state = ColumnState::Empty;
                if !column.prepare(ctx, &mut state, PrepareLevel::Completion) {
                    continue;
                }
                if let Some(name) = column.completion_name()
                    && !names.contains(&name)
                {
                    names.push(name);
                }
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{ColumnFlags, ColumnKind};

    struct Named {
        meta: ColumnMeta,
    }

    impl Named {
        fn new(name: &str) -> Self {
            Self {
                meta: ColumnMeta::new(name, ColumnFlags::VIEW_COLUMN),
            }
        }
    }

    impl PaperColumn for Named {
        fn meta(&self) -> &ColumnMeta {
            &self.meta
        }

        fn kind(&self) -> ColumnKind {
            ColumnKind::Id
        }
    }

    fn make_named(request: &FactoryRequest<'_>, _errors: &mut ColumnErrors) -> Option<Arc<dyn PaperColumn>> {
        let name = format!("{}{}", request.prefix, request.rest());
        Some(request.registry.register_or_get(Arc::new(Named::new(&name))))
    }

    fn make_shadow(request: &FactoryRequest<'_>, _errors: &mut ColumnErrors) -> Option<Arc<dyn PaperColumn>> {
        Some(Arc::new(Named::new(&format!("shadow-{}", request.name))))
    }

    fn decline(request: &FactoryRequest<'_>, errors: &mut ColumnErrors) -> Option<Arc<dyn PaperColumn>> {
        errors.add(format!("declined {}", request.name), 1);
        None
    }

    #[test]
    fn names_are_case_insensitive() {
        let registry = ColumnRegistry::default();
        registry.register(Named::new("Title"), &[]).expect("register");
        let mut errors = ColumnErrors::new();
        assert!(registry.lookup("TITLE", &mut errors).is_some());
        assert!(registry.lookup("title", &mut errors).is_some());
        assert!(errors.is_empty());
    }

    #[test]
    fn exact_name_beats_factory() {
        let registry = ColumnRegistry::default();
        registry.register(Named::new("tag:x"), &[]).expect("register");
        registry.register_factory("tag:", make_shadow, None);
        let mut errors = ColumnErrors::new();
        let column = registry.lookup("tag:x", &mut errors).expect("column");
        assert_eq!(column.name(), "tag:x");
    }

    #[test]
    fn factories_run_in_registration_order() {
        let registry = ColumnRegistry::default();
        registry.register_factory("tag:", make_named, None);
        registry.register_factory("", make_shadow, None);
        let mut errors = ColumnErrors::new();
        let column = registry.lookup("tag:accept", &mut errors).expect("column");
        assert_eq!(column.name(), "tag:accept");
        let column = registry.lookup("other", &mut errors).expect("column");
        assert_eq!(column.name(), "shadow-other");
    }

    #[test]
    fn declining_factories_fall_through_and_report() {
        let registry = ColumnRegistry::default();
        registry.register_factory("", decline, None);
        registry.register_factory("", make_named, None);
        let mut errors = ColumnErrors::new();
        let column = registry.lookup("Fresh", &mut errors).expect("column");
        assert_eq!(column.name(), "Fresh");
        assert_eq!(errors.messages(), ["declined Fresh"]);

        let again = registry.lookup("fresh", &mut errors).expect("column");
        assert!(Arc::ptr_eq(&column, &again));
    }

    #[test]
    fn synonyms_share_the_column() {
        let registry = ColumnRegistry::default();
        registry.register(Named::new("revpref"), &[]).expect("register");
        registry.register_synonym("pref", "revpref").expect("synonym");
        let first = registry.lookup_local("revpref").expect("column");
        let second = registry.lookup_local("PREF").expect("column");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.columns().len(), 1);
        assert_eq!(
            registry.register_synonym("x", "missing"),
            Err(RegistryError::UnknownSynonymTarget {
                name: "missing".into()
            })
        );
    }

    #[test]
    fn duplicates_are_rejected_atomically() {
        let registry = ColumnRegistry::default();
        registry.register(Named::new("id"), &[]).expect("register");
        let result = registry.register(Named::new("ident"), &["ID"]);
        assert_eq!(
            result.err(),
            Some(RegistryError::DuplicateName { name: "id".into() })
        );
        assert!(registry.lookup_local("ident").is_none());
    }
}
