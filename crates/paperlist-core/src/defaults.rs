//! The standard column catalogue.

use std::sync::Arc;

use paperlist_formula::Formula;
use paperlist_model::ConferenceSettings;
use tracing::info;

use crate::columns::{
    AbstractColumn, AssignReviewColumn, AuthorsColumn, CollaboratorsColumn, ConflictMatchColumn,
    DesirabilityColumn, FoldAllColumn, FormulaColumn, IdColumn, MatchField, NumericOrderColumn,
    PcConflictsColumn, PcRole, PcRoleColumn, PreferenceColumn, PreferenceListColumn,
    ReviewDelegationColumn, ReviewStatusColumn, ReviewSubmittedColumn, ReviewerListColumn,
    ReviewerTypeColumn, ScoreColumn, SelectorColumn, SelectorMode, StatusColumn, TagColumn,
    TagListColumn, TagReportColumn, TimestampColumn, TitleColumn, TopicListColumn,
    TopicScoreColumn, make_formula_column, make_score_column, make_tag_column,
};
use crate::error::RegistryError;
use crate::registry::ColumnRegistry;

/// Tag column prefixes, in lookup order.
const TAG_PREFIXES: [&str; 6] = ["tag:", "tagval:", "edittag:", "edittagval:", "#", "edit#"];

/// Builds a registry holding every standard column and factory for a
/// conference.
///
/// Fixed columns come first, then tag factories, the score factory, saved
/// formulas with the formula factory, and one report column per configured
/// tag report.
///
/// # Errors
///
/// Returns [`RegistryError::DuplicateName`] when a saved formula or tag
/// report collides with another column name.
pub fn build_default_registry(
    settings: Arc<ConferenceSettings>,
) -> Result<ColumnRegistry, RegistryError> {
    let registry = ColumnRegistry::new(Arc::clone(&settings));

    registry.register(SelectorColumn::new("sel", SelectorMode::Plain), &[])?;
    registry.register(SelectorColumn::new("selon", SelectorMode::On), &[])?;
    registry.register(SelectorColumn::new("selconf", SelectorMode::Conflict), &[])?;
    registry.register(
        SelectorColumn::new("selunlessconf", SelectorMode::UnlessConflict),
        &[],
    )?;
    registry.register(IdColumn::new(), &[])?;
    registry.register(TitleColumn::new(), &[])?;
    registry.register(StatusColumn::new("status", false), &[])?;
    registry.register(StatusColumn::new("statusfull", true), &[])?;
    registry.register(ReviewerTypeColumn::new(), &[])?;
    registry.register(ReviewStatusColumn::new(), &[])?;
    registry.register(ReviewSubmittedColumn::new(), &[])?;
    registry.register(ReviewDelegationColumn::new(), &[])?;
    registry.register(AssignReviewColumn::new(), &[])?;
    registry.register(TopicScoreColumn::new(), &[])?;
    registry.register(TopicListColumn::new(), &[])?;
    registry.register(PreferenceColumn::new("revpref", false), &["pref"])?;
    registry.register(PreferenceColumn::new("editrevpref", true), &["editpref"])?;
    registry.register(PreferenceListColumn::new("allrevpref", false), &["allpref"])?;
    registry.register(
        PreferenceListColumn::new("allrevtopicpref", true),
        &["alltopicpref"],
    )?;
    registry.register(DesirabilityColumn::new(), &[])?;
    registry.register(ReviewerListColumn::new(), &[])?;
    registry.register(AuthorsColumn::new(), &[])?;
    registry.register(CollaboratorsColumn::new(), &[])?;
    registry.register(TagListColumn::new(), &[])?;
    registry.register(AbstractColumn::new(), &[])?;
    registry.register(PcRoleColumn::new(PcRole::Lead), &[])?;
    registry.register(PcRoleColumn::new(PcRole::Shepherd), &[])?;
    registry.register(PcConflictsColumn::new(), &[])?;
    registry.register(ConflictMatchColumn::new(MatchField::Authors), &[])?;
    registry.register(ConflictMatchColumn::new(MatchField::Collaborators), &[])?;
    registry.register(TimestampColumn::new(), &[])?;
    registry.register(FoldAllColumn::new(), &[])?;
    registry.register(NumericOrderColumn::new(), &[])?;

    for prefix in TAG_PREFIXES {
        let prototype: Option<Arc<dyn crate::column::PaperColumn>> = match prefix {
            "#" => Some(Arc::new(TagColumn::prototype(false))),
            "edit#" => Some(Arc::new(TagColumn::prototype(true))),
            _ => None,
        };
        registry.register_factory(prefix, make_tag_column, prototype);
    }

    if settings.review_fields.iter().any(|field| field.has_options()) {
        registry.register_factory("", make_score_column, Some(Arc::new(ScoreColumn::prototype())));
    }

    for saved in &settings.formulas {
        let formula = Formula::saved(saved, Arc::clone(&settings));
        registry.register_formula(Arc::new(formula))?;
    }
    registry.register_factory("", make_formula_column, Some(Arc::new(FormulaColumn::prototype())));

    for tag in &settings.tag_reports {
        registry.register(TagReportColumn::new(tag), &[])?;
    }

    info!(
        columns = registry.columns().len(),
        formulas = settings.formulas.len(),
        "built column registry"
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ColumnErrors;
    use paperlist_model::{ReviewField, SavedFormula};

    fn settings() -> Arc<ConferenceSettings> {
        Arc::new(ConferenceSettings {
            review_fields: vec![ReviewField {
                id: "overall_merit".to_string(),
                name: "Overall merit".to_string(),
                abbreviation: "OveMer".to_string(),
                options: vec!["Reject".to_string(), "Weak".to_string(), "Accept".to_string()],
                ..ReviewField::default()
            }],
            formulas: vec![SavedFormula {
                id: 3,
                name: "Merit".to_string(),
                expression: "avg(OveMer)".to_string(),
                heading_title: String::new(),
            }],
            tag_reports: vec!["vote".to_string()],
            ..ConferenceSettings::default()
        })
    }

    #[test]
    fn registers_fixed_columns_in_order() {
        let registry = build_default_registry(settings()).expect("registry builds");
        let names: Vec<String> = registry
            .columns()
            .iter()
            .take(4)
            .map(|column| column.name().to_string())
            .collect();
        assert_eq!(names, ["sel", "selon", "selconf", "selunlessconf"]);
        assert!(registry.lookup_local("PREF").is_some());
        assert!(registry.lookup_local("tagrep_vote").is_some());
        assert!(registry.lookup_local("formula3").is_some());
    }

    #[test]
    fn factories_resolve_tags_scores_and_formulas() {
        let registry = build_default_registry(settings()).expect("registry builds");
        let mut errors = ColumnErrors::new();
        let tag = registry.lookup("#accept", &mut errors).expect("tag column");
        assert_eq!(tag.name(), "#accept");
        let score = registry.lookup("OveMer", &mut errors).expect("score column");
        assert_eq!(score.name(), "overall_merit");
        let saved = registry.lookup("merit", &mut errors).expect("saved formula");
        assert_eq!(saved.name(), "formula3");
        let adhoc = registry.lookup("1 + 2", &mut errors).expect("formula column");
        assert_eq!(adhoc.name(), "formulax2");
        assert!(errors.is_empty());
    }

    #[test]
    fn malformed_expressions_report_only_with_parentheses() {
        let registry = build_default_registry(settings()).expect("registry builds");
        let mut errors = ColumnErrors::new();
        assert!(registry.lookup("nosuchcolumn", &mut errors).is_none());
        assert!(errors.is_empty());
        assert!(registry.lookup("avg(", &mut errors).is_none());
        assert_eq!(errors.priority(), Some(1));
    }

    #[test]
    fn selectors_are_minimal_except_selconf() {
        let registry = build_default_registry(settings()).expect("registry builds");
        let minimal: Vec<(String, bool)> = ["sel", "selon", "selconf", "selunlessconf", "id", "title"]
            .iter()
            .map(|name| {
                let column = registry.lookup_local(name).expect("registered");
                (column.name().to_string(), column.meta().is_minimal())
            })
            .collect();
        assert_eq!(
            minimal,
            [
                ("sel".to_string(), true),
                ("selon".to_string(), true),
                ("selconf".to_string(), false),
                ("selunlessconf".to_string(), true),
                ("id".to_string(), true),
                ("title".to_string(), true),
            ]
        );
    }

    #[test]
    fn edit_names_are_never_formulas() {
        let registry = build_default_registry(settings()).expect("registry builds");
        let mut errors = ColumnErrors::new();
        assert!(registry.lookup("edit1", &mut errors).is_none());
    }
}
