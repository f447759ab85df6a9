//! Author lists, collaborators and conflict matching.

use paperlist_model::{Author, PaperRow};

use super::common::{comma_join, wrap_conflict};
use crate::column::{ColumnFlags, ColumnKind, ColumnMeta, ColumnState, PaperColumn, PrepareLevel};
use crate::context::ListContext;

/// Consecutive authors sharing an affiliation.
fn affiliation_groups(authors: &[Author]) -> Vec<(Vec<&Author>, &str)> {
    let any_affiliation = authors.iter().any(|author| !author.affiliation.is_empty());
    let mut groups: Vec<(Vec<&Author>, &str)> = Vec::new();
    for author in authors {
        let affiliation = if author.affiliation.is_empty() && any_affiliation {
            "unaffiliated"
        } else {
            author.affiliation.as_str()
        };
        match groups.last_mut() {
            Some((members, current)) if *current == affiliation => members.push(author),
            _ => groups.push((vec![author], affiliation)),
        }
    }
    groups
}

pub struct AuthorsColumn {
    meta: ColumnMeta,
}

impl AuthorsColumn {
    pub fn new() -> Self {
        Self {
            meta: ColumnMeta::new(
                "authors",
                ColumnFlags::VIEW_ROW | ColumnFlags::FOLDABLE | ColumnFlags::COMPLETABLE,
            )
            .with_css("pl_authors"),
        }
    }

    fn full(state: &ColumnState) -> bool {
        matches!(state, ColumnState::Authors { full: true })
    }
}

impl PaperColumn for AuthorsColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::Authors
    }

    /// Authors are listed with affiliations unless the viewer folded `aufull`.
    fn prepare(&self, ctx: &mut ListContext, state: &mut ColumnState, _level: PrepareLevel) -> bool {
        *state = ColumnState::Authors {
            full: !ctx.is_folded("aufull"),
        };
        true
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        "Authors".to_string()
    }

    fn content_empty(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> bool {
        !ctx.oracle.can_view_authors(&ctx.viewer, row, true)
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        let html = if Self::full(state) {
            let groups: Vec<String> = affiliation_groups(&row.authors)
                .into_iter()
                .map(|(members, affiliation)| {
                    let names: Vec<String> = members
                        .iter()
                        .map(|author| ctx.highlight("authors", &author.full_name()).0)
                        .collect();
                    let names = comma_join(&names);
                    if affiliation.is_empty() {
                        names
                    } else {
                        format!(
                            "{names} <span class=\"auaff\">({})</span>",
                            ctx.highlight("authors", affiliation).0
                        )
                    }
                })
                .collect();
            groups.join("; ")
        } else {
            let names: Vec<String> = row
                .authors
                .iter()
                .map(|author| ctx.highlight("authors", &author.abbreviated_name()).0)
                .collect();
            names.join(", ")
        };
        if ctx.oracle.can_view_authors(&ctx.viewer, row, false) {
            html
        } else {
            wrap_conflict(&html)
        }
    }

    fn text(&self, _ctx: &ListContext, state: &ColumnState, row: &PaperRow) -> String {
        if Self::full(state) {
            affiliation_groups(&row.authors)
                .into_iter()
                .map(|(members, affiliation)| {
                    let names: Vec<String> = members.iter().map(|a| a.full_name()).collect();
                    let names = comma_join(&names);
                    if affiliation.is_empty() {
                        names
                    } else {
                        format!("{names} ({affiliation})")
                    }
                })
                .collect::<Vec<_>>()
                .join("; ")
        } else {
            row.authors
                .iter()
                .map(Author::abbreviated_name)
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

fn collaborator_lines(row: &PaperRow) -> impl Iterator<Item = &str> {
    row.collaborators
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

fn has_collaborators(row: &PaperRow) -> bool {
    let text = row.collaborators.trim();
    !text.is_empty() && !text.eq_ignore_ascii_case("none")
}

pub struct CollaboratorsColumn {
    meta: ColumnMeta,
}

impl CollaboratorsColumn {
    pub fn new() -> Self {
        Self {
            meta: ColumnMeta::new(
                "collab",
                ColumnFlags::VIEW_ROW | ColumnFlags::FOLDABLE | ColumnFlags::COMPLETABLE,
            )
            .with_css("pl_collab"),
        }
    }
}

impl PaperColumn for CollaboratorsColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::Collaborators
    }

    fn prepare(&self, ctx: &mut ListContext, _state: &mut ColumnState, _level: PrepareLevel) -> bool {
        ctx.settings.collaborators_enabled
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        "Collaborators".to_string()
    }

    fn content_empty(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> bool {
        !has_collaborators(row) || !ctx.oracle.can_view_authors(&ctx.viewer, row, true)
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        collaborator_lines(row)
            .map(|line| ctx.highlight("collaborators", line).0)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn text(&self, _ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> String {
        collaborator_lines(row).collect::<Vec<_>>().join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    Authors,
    Collaborators,
}

impl MatchField {
    fn key(self) -> &'static str {
        match self {
            MatchField::Authors => "authors",
            MatchField::Collaborators => "collaborators",
        }
    }
}

/// Lines of the author list or collaborators matching the search; chairs use
/// it to spot potential conflicts.
pub struct ConflictMatchColumn {
    meta: ColumnMeta,
    field: MatchField,
}

impl ConflictMatchColumn {
    pub fn new(field: MatchField) -> Self {
        let name = match field {
            MatchField::Authors => "authorsmatch",
            MatchField::Collaborators => "collabmatch",
        };
        Self {
            meta: ColumnMeta::new(name, ColumnFlags::VIEW_ROW | ColumnFlags::FOLDABLE)
                .with_css("pl_conflictmatch"),
            field,
        }
    }

    fn lines(&self, row: &PaperRow) -> Vec<String> {
        match self.field {
            MatchField::Authors => row
                .authors
                .iter()
                .map(|author| {
                    if author.affiliation.is_empty() {
                        author.full_name()
                    } else {
                        format!("{} ({})", author.full_name(), author.affiliation)
                    }
                })
                .collect(),
            MatchField::Collaborators => collaborator_lines(row).map(str::to_string).collect(),
        }
    }

    fn matches(&self, ctx: &ListContext, row: &PaperRow) -> Vec<(String, String)> {
        self.lines(row)
            .into_iter()
            .filter_map(|line| {
                let (html, count) = ctx.highlight(self.field.key(), &line);
                (count > 0).then_some((html, line))
            })
            .collect()
    }
}

impl PaperColumn for ConflictMatchColumn {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::ConflictMatch
    }

    fn prepare(&self, ctx: &mut ListContext, _state: &mut ColumnState, _level: PrepareLevel) -> bool {
        ctx.viewer.is_chair()
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        match self.field {
            MatchField::Authors => "<strong>Potential conflict in authors</strong>".to_string(),
            MatchField::Collaborators => {
                "<strong>Potential conflict in collaborators</strong>".to_string()
            }
        }
    }

    fn content_empty(&self, ctx: &ListContext, _state: &ColumnState, _row: &PaperRow) -> bool {
        !ctx.has_match_pattern(self.field.key())
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        _state: &mut ColumnState,
        row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        self.matches(ctx, row)
            .into_iter()
            .map(|(html, _)| html)
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn text(&self, ctx: &ListContext, _state: &ColumnState, row: &PaperRow) -> String {
        self.matches(ctx, row)
            .into_iter()
            .map(|(_, line)| line)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(first: &str, last: &str, affiliation: &str) -> Author {
        Author {
            first_name: first.to_string(),
            last_name: last.to_string(),
            affiliation: affiliation.to_string(),
            ..Author::default()
        }
    }

    #[test]
    fn groups_consecutive_affiliations() {
        let authors = vec![
            author("Ada", "Lovelace", "Analytical"),
            author("Charles", "Babbage", "Analytical"),
            author("Alan", "Turing", ""),
        ];
        let groups = affiliation_groups(&authors);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0.len(), 2);
        assert_eq!(groups[0].1, "Analytical");
        assert_eq!(groups[1].1, "unaffiliated");
    }

    #[test]
    fn none_is_no_collaborators() {
        let mut row = PaperRow::new(1, "t");
        row.collaborators = " None ".to_string();
        assert!(!has_collaborators(&row));
        row.collaborators = "MIT\n\n  CMU ".to_string();
        assert_eq!(collaborator_lines(&row).collect::<Vec<_>>(), ["MIT", "CMU"]);
    }
}
