//! The record store seam.
//!
//! A listing asks its [`RecordStore`] for rows exactly once, passing the
//! [`QueryOptions`] its columns accumulated while preparing. Columns that need
//! more (a reviewer-of-interest's assignments, for instance) issue one batch
//! follow-up from [`PaperColumn::analyze`](crate::column::PaperColumn::analyze).

use paperlist_model::{ContactId, PaperId, PaperRow, QueryOptions, ReviewRow};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {message}")]
    Query { message: String },
}

/// One reviewer's relation to one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewerRow {
    pub paper_id: PaperId,
    pub review: Option<ReviewRow>,
    pub conflict_type: i32,
}

pub trait RecordStore: Send + Sync {
    /// Fetches the rows of a listing.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the rows cannot be read.
    fn fetch(&self, options: &QueryOptions) -> Result<Vec<PaperRow>, StoreError>;

    /// Fetches `reviewer`'s review and conflict on each of `papers`.
    ///
    /// Submissions the reviewer has no relation to are omitted.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the rows cannot be read.
    fn fetch_reviewer_rows(
        &self,
        reviewer: ContactId,
        papers: &[PaperId],
    ) -> Result<Vec<ReviewerRow>, StoreError>;
}

/// A store over rows held in memory.
///
/// Data a listing did not ask for is stripped from the returned rows, so
/// columns that forget to record their needs render as if it were absent.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    papers: Vec<PaperRow>,
}

impl MemoryStore {
    pub fn new(papers: Vec<PaperRow>) -> Self {
        Self { papers }
    }

    pub fn papers(&self) -> &[PaperRow] {
        &self.papers
    }
}

impl RecordStore for MemoryStore {
    fn fetch(&self, options: &QueryOptions) -> Result<Vec<PaperRow>, StoreError> {
        let tags = options.is_set("tags");
        let topics = options.is_set("topics") || options.is_set("topicInterestScore");
        debug!(
            rows = self.papers.len(),
            tags, topics, "fetching rows from memory"
        );
        Ok(self
            .papers
            .iter()
            .map(|paper| {
                let mut row = paper.clone();
                if !tags {
                    row.paper_tags.clear();
                }
                if !topics {
                    row.topic_ids.clear();
                }
                row
            })
            .collect())
    }

    fn fetch_reviewer_rows(
        &self,
        reviewer: ContactId,
        papers: &[PaperId],
    ) -> Result<Vec<ReviewerRow>, StoreError> {
        Ok(self
            .papers
            .iter()
            .filter(|paper| papers.contains(&paper.paper_id))
            .filter_map(|paper| {
                let review = paper.review_by(reviewer).cloned();
                let conflict_type = paper.conflict_type(reviewer);
                (review.is_some() || conflict_type > 0).then(|| ReviewerRow {
                    paper_id: paper.paper_id,
                    review,
                    conflict_type,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        let mut paper = PaperRow::new(1, "Tagged");
        paper.paper_tags = " accept#0".to_string();
        paper.topic_ids = vec![3];
        paper.conflicts.insert(ContactId(7), 2);
        MemoryStore::new(vec![paper, PaperRow::new(2, "Plain")])
    }

    #[test]
    fn strips_data_nobody_asked_for() {
        let rows = store().fetch(&QueryOptions::new()).expect("rows");
        assert!(rows[0].paper_tags.is_empty());
        assert!(rows[0].topic_ids.is_empty());

        let mut options = QueryOptions::new();
        options.set_flag("tags");
        let rows = store().fetch(&options).expect("rows");
        assert_eq!(rows[0].paper_tags, " accept#0");
    }

    #[test]
    fn reviewer_rows_cover_only_related_papers() {
        let rows = store()
            .fetch_reviewer_rows(ContactId(7), &[PaperId(1), PaperId(2)])
            .expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].paper_id, PaperId(1));
        assert_eq!(rows[0].conflict_type, 2);
        assert!(rows[0].review.is_none());
    }
}
