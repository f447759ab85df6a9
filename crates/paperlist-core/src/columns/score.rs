//! Review score columns, one per review form field with score options.

use std::cmp::Ordering;
use std::sync::Arc;

use paperlist_formula::ScoreInfo;
use paperlist_model::{PaperRow, ReviewField};

use super::common::{escape, escape_attr, wrap_conflict};
use crate::column::{ColumnFlags, ColumnKind, ColumnMeta, ColumnState, PaperColumn, PrepareLevel};
use crate::context::ListContext;
use crate::error::ColumnErrors;
use crate::registry::{ColumnRegistry, FactoryRequest};
use crate::sort::{ScoreSortMethod, SortKey, Sorter};

/// Scores on `field` the viewer may see, or `None` when the field is hidden
/// from them on this submission.
fn viewable_scores(
    ctx: &ListContext,
    row: &PaperRow,
    field: &ReviewField,
    force: bool,
) -> Option<Vec<i32>> {
    let bound = ctx.oracle.view_score_bound(&ctx.viewer, row, force);
    if !field.view_score.visible_above(bound) {
        return None;
    }
    let scores = row
        .reviews
        .iter()
        .filter(|review| ctx.oracle.can_view_review(&ctx.viewer, row, review, force))
        .filter_map(|review| review.scores.get(&field.id).copied())
        .filter(|score| *score > 0)
        .collect();
    Some(scores)
}

/// Whether some score on `field` could be visible, without collecting them.
fn may_have_viewable_scores(ctx: &ListContext, row: &PaperRow, field: &ReviewField) -> bool {
    let bound = ctx.oracle.view_score_bound(&ctx.viewer, row, true);
    field.view_score.visible_above(bound)
        && row
            .reviews
            .iter()
            .any(|review| review.scores.contains_key(&field.id))
}

fn primary_key(method: ScoreSortMethod, info: &ScoreInfo, max_score: usize, mine: Option<i32>) -> SortKey {
    let float = |value: Option<f64>| SortKey::Float(value.unwrap_or(-1.0));
    match method {
        ScoreSortMethod::Counts => SortKey::Text(info.counts_descending(max_score)),
        ScoreSortMethod::Average => float(info.mean()),
        ScoreSortMethod::Median => float(info.median()),
        ScoreSortMethod::Variance => float(info.variance()),
        ScoreSortMethod::MaxMinDiff => float(info.max().zip(info.min()).map(|(max, min)| max - min)),
        ScoreSortMethod::MyScore => float(mine.map(f64::from)),
    }
}

fn empty_primary_key(method: ScoreSortMethod) -> SortKey {
    match method {
        ScoreSortMethod::Counts => SortKey::Text(String::new()),
        _ => SortKey::Float(-1.0),
    }
}

/// Scores as a compact chart; `mine` is marked.
fn score_chart(scores: &[i32], max_score: usize, mine: Option<i32>) -> String {
    let mut counts = vec![0usize; max_score];
    for score in scores {
        if let Some(slot) = usize::try_from(*score)
            .ok()
            .and_then(|score| score.checked_sub(1))
            .and_then(|index| counts.get_mut(index))
        {
            *slot += 1;
        }
    }
    let data = counts
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let mine = mine.map(|score| format!("&amp;h={score}")).unwrap_or_default();
    let mut sorted = scores.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let label = sorted
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "<span class=\"need-scorechart\" data-scorechart=\"v={data}&amp;m={max_score}{mine}\">{}</span>",
        escape_attr(&label)
    )
}

pub struct ScoreColumn {
    meta: ColumnMeta,
    /// Review field id; `None` for the completion prototype.
    field_id: Option<String>,
    abbreviation: String,
}

impl ScoreColumn {
    pub fn new(field: &ReviewField) -> Self {
        Self {
            meta: ColumnMeta::new(
                field.id.as_str(),
                ColumnFlags::VIEW_COLUMN
                    | ColumnFlags::FOLDABLE
                    | ColumnFlags::COMPLETABLE
                    | ColumnFlags::MINIMAL,
            )
            .with_css("pl_score")
            .with_sorter("score"),
            field_id: Some(field.id.clone()),
            abbreviation: field.web_abbreviation().to_string(),
        }
    }

    /// Stands for every score column in completion.
    pub fn prototype() -> Self {
        Self {
            meta: ColumnMeta::new("score", ColumnFlags::VIEW_COLUMN | ColumnFlags::COMPLETABLE)
                .with_css("pl_score"),
            field_id: None,
            abbreviation: String::new(),
        }
    }

    fn field(state: &ColumnState) -> Option<&ReviewField> {
        match state {
            ColumnState::Score { field } => Some(field),
            _ => None,
        }
    }

    fn mine(ctx: &ListContext, row: &PaperRow, field: &ReviewField) -> Option<i32> {
        row.review_by(ctx.reviewer_cid())
            .and_then(|review| review.scores.get(&field.id).copied())
            .filter(|score| *score > 0)
    }
}

/// Builds score columns for review fields that have score options and appear
/// on the form.
pub fn make_score_column(
    request: &FactoryRequest<'_>,
    _errors: &mut ColumnErrors,
) -> Option<Arc<dyn PaperColumn>> {
    let field = request.settings().review_field(request.name)?;
    if !field.has_options() || field.display_order.is_none() {
        return None;
    }
    if let Some(column) = request.registry.lookup_local(&field.id) {
        return Some(column);
    }
    Some(request.registry.register_or_get(Arc::new(ScoreColumn::new(field))))
}

impl PaperColumn for ScoreColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::Score
    }

    fn prepare(&self, ctx: &mut ListContext, state: &mut ColumnState, level: PrepareLevel) -> bool {
        if !ctx.scores_ok {
            return false;
        }
        let Some(field) = self
            .field_id
            .as_deref()
            .and_then(|id| ctx.settings.review_field(id))
            .cloned()
        else {
            return false;
        };
        if !field
            .view_score
            .visible_above(ctx.oracle.permissive_view_score_bound(&ctx.viewer))
        {
            return false;
        }
        if level.needs_data() {
            ctx.qopts.add_to_set("scores", &field.id);
            ctx.qopts.set_flag("need_javascript");
        }
        *state = ColumnState::Score { field };
        true
    }

    fn sort_prepare(
        &self,
        ctx: &ListContext,
        state: &ColumnState,
        rows: &[PaperRow],
        sorter: &Sorter,
    ) -> Vec<SortKey> {
        let Some(field) = Self::field(state) else {
            return vec![SortKey::Null; rows.len()];
        };
        rows.iter()
            .map(|row| match viewable_scores(ctx, row, field, false) {
                Some(scores) if !scores.is_empty() => {
                    let info = ScoreInfo::from_scores(scores);
                    let mine = Self::mine(ctx, row, field);
                    SortKey::List(vec![
                        primary_key(sorter.score_method, &info, field.max_score(), mine),
                        SortKey::Float(info.mean().unwrap_or(-1.0)),
                    ])
                }
                _ => SortKey::List(vec![
                    empty_primary_key(sorter.score_method),
                    SortKey::Float(-1.0),
                ]),
            })
            .collect()
    }

    /// Higher scores first.
    fn compare(&self, a: &SortKey, b: &SortKey, _sorter: &Sorter) -> Ordering {
        b.cmp(a)
    }

    fn header(&self, _ctx: &ListContext, state: &ColumnState) -> String {
        Self::field(state)
            .map(|field| escape(field.web_abbreviation()))
            .unwrap_or_default()
    }

    fn completion_name(&self) -> Option<String> {
        self.field_id.as_ref()?;
        Some(self.abbreviation.clone())
    }

    fn completion_instances(&self, registry: &ColumnRegistry) -> Option<Vec<Arc<dyn PaperColumn>>> {
        let columns = registry
            .settings()
            .score_fields()
            .into_iter()
            .map(|field| {
                registry
                    .lookup_local(&field.id)
                    .unwrap_or_else(|| registry.register_or_get(Arc::new(ScoreColumn::new(field))))
            })
            .collect();
        Some(columns)
    }

    fn content_empty(&self, ctx: &ListContext, state: &ColumnState, row: &PaperRow) -> bool {
        Self::field(state).is_none_or(|field| !may_have_viewable_scores(ctx, row, field))
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        state: &mut ColumnState,
        row: &PaperRow,
        rowidx: usize,
    ) -> String {
        let Some(field) = Self::field(state) else {
            return String::new();
        };
        let mut forced = false;
        let mut scores = viewable_scores(ctx, row, field, false);
        if scores.is_none() && ctx.oracle.allow_administer(&ctx.viewer, row) {
            forced = true;
            scores = viewable_scores(ctx, row, field, true);
        }
        let Some(scores) = scores.filter(|scores| !scores.is_empty()) else {
            return String::new();
        };
        let mut html = score_chart(&scores, field.max_score(), Self::mine(ctx, row, field));
        if ctx.live_table && rowidx % 16 == 15 {
            html.push_str("<script>scorechart()</script>");
        }
        if forced { wrap_conflict(&html) } else { html }
    }

    fn text(&self, ctx: &ListContext, state: &ColumnState, row: &PaperRow) -> String {
        let Some(field) = Self::field(state) else {
            return String::new();
        };
        let mut scores = viewable_scores(ctx, row, field, false).unwrap_or_default();
        scores.sort_unstable_by(|a, b| b.cmp(a));
        scores
            .iter()
            .map(i32::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
