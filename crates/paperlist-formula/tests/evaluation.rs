//! Formula evaluation against submissions and viewers of different rank.

use std::collections::BTreeMap;
use std::sync::Arc;

use paperlist_formula::{EvalMode, Formula, FormulaValue, HIDDEN_SENTINEL, ScoreInfo, Statistic};
use paperlist_model::{
    CapabilityOracle, ConferenceSettings, Contact, ContactId, PaperRow, QueryOptions,
    REVIEW_PC, REVIEW_PRIMARY, ReviewField, ReviewRow, RolePolicy, Roles, ViewScore,
};
use proptest::prelude::*;

fn settings() -> Arc<ConferenceSettings> {
    Arc::new(ConferenceSettings {
        review_fields: vec![
            ReviewField {
                id: "overAllMerit".to_string(),
                name: "Overall merit".to_string(),
                abbreviation: "OveMer".to_string(),
                options: (1..=5).map(|n| n.to_string()).collect(),
                display_order: Some(1),
                ..ReviewField::default()
            },
            ReviewField {
                id: "chairScore".to_string(),
                name: "Chair score".to_string(),
                abbreviation: "Secret".to_string(),
                options: (1..=3).map(|n| n.to_string()).collect(),
                view_score: ViewScore::ADMIN_ONLY,
                display_order: Some(2),
            },
        ],
        ..ConferenceSettings::default()
    })
}

fn review(contact: u32, merit: i32, secret: i32) -> ReviewRow {
    ReviewRow {
        contact_id: ContactId(contact),
        review_type: REVIEW_PRIMARY,
        submitted: true,
        scores: BTreeMap::from([
            ("overAllMerit".to_string(), merit),
            ("chairScore".to_string(), secret),
        ]),
        ..ReviewRow::default()
    }
}

fn papers() -> Vec<PaperRow> {
    let mut first = PaperRow::new(1, "Log-Structured Merge Trees Revisited");
    first.reviews = vec![review(10, 4, 3), review(11, 2, 1)];
    first.paper_tags = " accept#0 rank#4".to_string();
    let mut second = PaperRow::new(2, "A Note on Raft");
    second.reviews = vec![
        review(10, 5, 2),
        review(12, 3, 2),
        ReviewRow {
            contact_id: ContactId(13),
            review_type: REVIEW_PC,
            ..ReviewRow::default()
        },
    ];
    vec![first, second]
}

fn chair() -> Contact {
    Contact::new(1, "Ada", "Chair").with_roles(Roles {
        chair: true,
        ..Roles::default()
    })
}

fn pc(id: u32) -> Contact {
    Contact::new(id, "Pat", "Member").with_roles(Roles {
        pc: true,
        ..Roles::default()
    })
}

fn oracle() -> Arc<dyn CapabilityOracle> {
    Arc::new(RolePolicy::new(settings()))
}

fn evaluate(expression: &str, viewer: &Contact, mode: EvalMode) -> Vec<FormulaValue> {
    let formula = Formula::new(expression, settings());
    let compiled = formula
        .compile_function(viewer, oracle())
        .expect("formula compiles");
    papers()
        .iter()
        .map(|paper| compiled.evaluate(paper, mode))
        .collect()
}

#[test]
fn restricted_field_is_hidden_from_pc_but_not_from_chair() {
    let for_pc = evaluate("avg(Secret)", &pc(20), EvalMode::Raw);
    assert!(for_pc.iter().all(|value| value.is_hidden()));
    assert!(for_pc.iter().all(|value| value.to_html() == HIDDEN_SENTINEL));

    let for_chair = evaluate("avg(Secret)", &chair(), EvalMode::Raw);
    assert_eq!(
        for_chair,
        vec![FormulaValue::Number(2.0), FormulaValue::Number(2.0)]
    );
}

#[test]
fn sort_keys_never_expose_hidden_values() {
    let keys = evaluate("avg(Secret) + 1", &pc(20), EvalMode::SortKey);
    assert_eq!(keys, vec![FormulaValue::Null, FormulaValue::Null]);
}

#[test]
fn aggregates_skip_reviews_without_scores() {
    let viewer = pc(20);
    assert_eq!(
        evaluate("count(OveMer)", &viewer, EvalMode::Raw),
        vec![FormulaValue::Number(2.0), FormulaValue::Number(2.0)]
    );
    assert_eq!(
        evaluate("median(OveMer)", &viewer, EvalMode::Raw),
        vec![FormulaValue::Number(3.0), FormulaValue::Number(4.0)]
    );
    assert_eq!(
        evaluate("max(OveMer) - min(OveMer)", &viewer, EvalMode::Raw),
        vec![FormulaValue::Number(2.0), FormulaValue::Number(2.0)]
    );
}

#[test]
fn my_reads_the_viewers_own_review() {
    assert_eq!(
        evaluate("my(OveMer)", &pc(10), EvalMode::Raw),
        vec![FormulaValue::Number(4.0), FormulaValue::Number(5.0)]
    );
    assert_eq!(
        evaluate("my(OveMer)", &pc(20), EvalMode::Raw),
        vec![FormulaValue::Null, FormulaValue::Null]
    );
}

#[test]
fn tags_evaluate_to_presence_or_value() {
    let viewer = pc(20);
    assert_eq!(
        evaluate("#accept", &viewer, EvalMode::Raw),
        vec![FormulaValue::Bool(true), FormulaValue::Bool(false)]
    );
    assert_eq!(
        evaluate("#rank * 10", &viewer, EvalMode::Raw),
        vec![FormulaValue::Number(40.0), FormulaValue::Number(0.0)]
    );
}

#[test]
fn conflicted_pc_sees_hidden_tags() {
    let formula = Formula::new("#accept", settings());
    let compiled = formula.compile_function(&pc(20), oracle()).expect("compile");
    let mut paper = papers().remove(0);
    paper.conflicts.insert(ContactId(20), 2);
    assert_eq!(compiled.evaluate(&paper, EvalMode::Raw), FormulaValue::Hidden);
    assert_eq!(compiled.evaluate(&paper, EvalMode::Raw).to_text(), "?");
}

#[test]
fn check_is_cached_and_reports_errors() {
    let formula = Formula::new("avg(OveMer) <", settings());
    assert!(!formula.check());
    assert!(!formula.check());
    let first = formula.error().expect("error");
    let second = formula.error().expect("error");
    assert!(std::ptr::eq(first, second));
    assert_eq!(formula.base_view_score(), ViewScore::FALSE);
    assert!(
        formula
            .error_html()
            .expect("html")
            .contains("avg(OveMer) &lt;")
    );
    assert!(formula.compile_function(&chair(), oracle()).is_err());
}

#[test]
fn query_options_name_the_scores_read() {
    let formula = Formula::new("avg(OveMer) + #rank", settings());
    let mut options = QueryOptions::new();
    formula.add_query_options(&mut options);
    assert!(options.contains_member("scores", "overAllMerit"));
    assert!(!options.contains_member("scores", "chairScore"));
    assert!(options.is_set("tags"));
    assert_eq!(formula.base_view_score(), ViewScore::PC);
}

#[test]
fn forced_mode_lets_conflicted_chair_see_through() {
    let formula = Formula::new("avg(OveMer)", settings());
    let compiled = formula.compile_function(&chair(), oracle()).expect("compile");
    let mut paper = papers().remove(0);
    paper.conflicts.insert(ContactId(1), 2);
    assert_eq!(compiled.evaluate(&paper, EvalMode::Raw), FormulaValue::Hidden);
    assert_eq!(
        compiled.evaluate(&paper, EvalMode::Forced),
        FormulaValue::Number(3.0)
    );
}

proptest! {
    #[test]
    fn mean_lies_between_min_and_max(scores in proptest::collection::vec(1i32..=9, 1..20)) {
        let info = ScoreInfo::from_scores(scores);
        let mean = info.mean().expect("non-empty");
        prop_assert!(info.min().expect("min") <= mean);
        prop_assert!(mean <= info.max().expect("max"));
        prop_assert_eq!(info.statistic(Statistic::Count), FormulaValue::Number(info.count() as f64));
    }
}
