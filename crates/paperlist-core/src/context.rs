//! Per-request listing context.
//!
//! # Architecture
//!
//! A [`ListContext`] is created for every listing request and owned by it.
//! It bundles several concerns:
//!
//! - **Viewer**: the user the listing is rendered for, with the
//!   [`CapabilityOracle`] answering visibility questions about them
//! - **Search**: limit, reviewer of interest and compiled match patterns
//! - **Query options**: data columns asked the record store for
//! - **Sorters**: the requested orderings, each with its own handle
//! - **Output flags**: [`AnyFlags`] and deduplicated footer fragments
//!
//! The options a caller can set are gathered in [`ListOptions`] so they can be
//! loaded from a request body or a command line.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use paperlist_model::{
    CapabilityOracle, ConferenceSettings, Contact, ContactId, PaperId, QueryOptions,
    SearchContext,
};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::sort::{SortSpec, Sorter, SorterHandle};

/// Facts discovered while rendering, used by the surrounding page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnyFlags {
    /// A selector checkbox was rendered.
    pub sel: bool,
    pub need_submit: bool,
    pub accepted: bool,
    pub need_final: bool,
    pub need_review: bool,
}

/// Caller-supplied options for one listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListOptions {
    /// Requested column names, in display order.
    pub columns: Vec<String>,
    /// Sorter specifications such as `-title` or `OveMer:avg`.
    pub sort: Vec<String>,
    /// Columns and sections the viewer folded away.
    pub folded: Vec<String>,
    pub search: SearchContext,
    /// Explicit selector state; unlisted submissions use the default.
    pub paper_selection: Option<BTreeMap<PaperId, bool>>,
    /// Submission order for the `numericorder` column.
    pub numeric_order: Vec<PaperId>,
    /// Rendering into a table updated in place.
    pub live_table: bool,
}

/// State of one listing request.
pub struct ListContext {
    pub viewer: Contact,
    pub oracle: Arc<dyn CapabilityOracle>,
    pub settings: Arc<ConferenceSettings>,
    pub search: SearchContext,
    pub qopts: QueryOptions,
    pub sorters: Vec<Sorter>,
    pub any: AnyFlags,
    pub paper_selection: Option<BTreeMap<PaperId, bool>>,
    pub live_table: bool,
    /// One-based number of the row being rendered.
    pub count: usize,
    /// The viewer may see review scores on at least some submissions.
    pub scores_ok: bool,
    folded: BTreeSet<String>,
    numeric_order: HashMap<PaperId, i64>,
    match_patterns: BTreeMap<String, Regex>,
    footer_scripts: Vec<String>,
    footer_html: Vec<(String, String)>,
    next_sorter: u32,
}

impl std::fmt::Debug for ListContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListContext")
            .field("viewer", &self.viewer.contact_id)
            .field("search", &self.search)
            .field("qopts", &self.qopts)
            .field("sorters", &self.sorters)
            .field("any", &self.any)
            .finish_non_exhaustive()
    }
}

impl ListContext {
    pub fn new(
        viewer: Contact,
        oracle: Arc<dyn CapabilityOracle>,
        settings: Arc<ConferenceSettings>,
    ) -> Self {
        let scores_ok =
            viewer.is_chair() || oracle.is_reviewer(&viewer) || settings.author_view_reviews;
        Self {
            viewer,
            oracle,
            settings,
            search: SearchContext::default(),
            qopts: QueryOptions::new(),
            sorters: Vec::new(),
            any: AnyFlags::default(),
            paper_selection: None,
            live_table: false,
            count: 0,
            scores_ok,
            folded: BTreeSet::new(),
            numeric_order: HashMap::new(),
            match_patterns: BTreeMap::new(),
            footer_scripts: Vec::new(),
            footer_html: Vec::new(),
            next_sorter: 0,
        }
    }

    /// Applies every caller-supplied option except the column list.
    pub fn with_options(mut self, options: &ListOptions) -> Self {
        self = self
            .with_search(options.search.clone())
            .with_folded(options.folded.iter().map(String::as_str));
        for spec in &options.sort {
            match SortSpec::parse(spec) {
                Some(spec) => {
                    self.add_sorter(spec);
                }
                None => warn!(spec = %spec, "ignoring empty sort specification"),
            }
        }
        self.paper_selection.clone_from(&options.paper_selection);
        self.numeric_order = options
            .numeric_order
            .iter()
            .enumerate()
            .map(|(position, paper)| (*paper, position as i64))
            .collect();
        self.live_table = options.live_table;
        self
    }

    /// Sets the search and compiles its match patterns, case-insensitively.
    ///
    /// Invalid patterns are logged and ignored.
    pub fn with_search(mut self, search: SearchContext) -> Self {
        self.match_patterns.clear();
        for (field, pattern) in &search.match_patterns {
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(regex) => {
                    self.match_patterns.insert(field.to_lowercase(), regex);
                }
                Err(error) => {
                    warn!(field = %field, %error, "ignoring invalid match pattern");
                }
            }
        }
        self.search = search;
        self
    }

    pub fn with_folded<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.folded
            .extend(names.into_iter().map(str::to_lowercase));
        self
    }

    pub fn add_sorter(&mut self, spec: SortSpec) -> SorterHandle {
        self.next_sorter += 1;
        let handle = SorterHandle(self.next_sorter);
        self.sorters.push(Sorter {
            handle,
            column: spec.column,
            reverse: spec.reverse,
            score_method: spec.score_method,
        });
        handle
    }

    pub fn is_folded(&self, name: &str) -> bool {
        self.folded.contains(&name.to_lowercase())
    }

    /// The reviewer the listing is about: the search's, else the viewer.
    pub fn reviewer_contact(&self) -> &Contact {
        self.search.reviewer.as_ref().unwrap_or(&self.viewer)
    }

    pub fn reviewer_cid(&self) -> ContactId {
        self.reviewer_contact().contact_id
    }

    pub fn numeric_position(&self, paper: PaperId) -> Option<i64> {
        self.numeric_order.get(&paper).copied()
    }

    pub fn has_match_pattern(&self, field: &str) -> bool {
        self.match_patterns.contains_key(field)
    }

    /// Escapes `text`, wrapping matches of the field's pattern.
    ///
    /// Returns the markup and the number of matches.
    pub fn highlight(&self, field: &str, text: &str) -> (String, usize) {
        let Some(regex) = self.match_patterns.get(field) else {
            return (html_escape::encode_text(text).into_owned(), 0);
        };
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        let mut matches = 0;
        for found in regex.find_iter(text) {
            if found.is_empty() {
                continue;
            }
            out.push_str(&html_escape::encode_text(&text[last..found.start()]));
            out.push_str("<span class=\"match\">");
            out.push_str(&html_escape::encode_text(found.as_str()));
            out.push_str("</span>");
            last = found.end();
            matches += 1;
        }
        out.push_str(&html_escape::encode_text(&text[last..]));
        (out, matches)
    }

    /// Queues a footer script once, however many columns ask for it.
    pub fn add_footer_script(&mut self, script: impl Into<String>) {
        let script = script.into();
        if !self.footer_scripts.contains(&script) {
            self.footer_scripts.push(script);
        }
    }

    /// Queues footer markup once per `key`.
    pub fn add_footer_html(&mut self, key: &str, html: impl Into<String>) {
        if !self.footer_html.iter().any(|(existing, _)| existing == key) {
            self.footer_html.push((key.to_string(), html.into()));
        }
    }

    pub fn footer_scripts(&self) -> &[String] {
        &self.footer_scripts
    }

    pub fn footer_html(&self) -> impl Iterator<Item = &str> {
        self.footer_html.iter().map(|(_, html)| html.as_str())
    }
}
