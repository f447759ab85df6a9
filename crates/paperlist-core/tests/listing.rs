//! End-to-end listings over an in-memory store.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use paperlist_core::{
    ColumnFlags, ColumnKind, ColumnMeta, ColumnRegistry, ColumnState, ListContext, ListError,
    ListOptions, MemoryStore, PaperColumn, PaperList, PrepareLevel, RecordStore, RenderedList,
    ReviewerRow, SortKey, Sorter, StoreError, build_default_registry,
};
use paperlist_model::{
    ConferenceSettings, Contact, ContactId, PaperId, PaperRow, QueryOptions, REVIEW_PRIMARY,
    ReviewField, ReviewRow, RolePolicy, Roles, SavedFormula,
};

fn settings() -> Arc<ConferenceSettings> {
    Arc::new(ConferenceSettings {
        review_fields: vec![ReviewField {
            id: "overAllMerit".to_string(),
            name: "Overall merit".to_string(),
            abbreviation: "OveMer".to_string(),
            options: (1..=4).map(|n| n.to_string()).collect(),
            display_order: Some(1),
            ..ReviewField::default()
        }],
        formulas: vec![SavedFormula {
            id: 1,
            name: "Merit".to_string(),
            expression: "avg(OveMer)".to_string(),
            heading_title: String::new(),
        }],
        ..ConferenceSettings::default()
    })
}

fn review(contact: u32, merit: i32) -> ReviewRow {
    ReviewRow {
        contact_id: ContactId(contact),
        review_type: REVIEW_PRIMARY,
        submitted: true,
        scores: BTreeMap::from([("overAllMerit".to_string(), merit)]),
        ..ReviewRow::default()
    }
}

fn papers() -> Vec<PaperRow> {
    let mut raft = PaperRow::new(1, "Raft Revisited");
    raft.time_submitted = 100;
    raft.outcome = 1;
    raft.paper_tags = " accept#0 urgent#2".to_string();
    raft.reviews = vec![review(10, 3), review(11, 4)];

    let mut paxos = PaperRow::new(2, "paxos made simple");
    paxos.time_submitted = 110;
    paxos.paper_tags = " accept#0".to_string();
    paxos.conflicts.insert(ContactId(2), 2);
    paxos.reviews = vec![review(10, 2)];

    let mut again = PaperRow::new(3, "Paxos Made Simple");
    again.time_submitted = 120;

    vec![again, raft, paxos]
}

fn chair() -> Contact {
    Contact::new(1, "Ada", "Chair").with_roles(Roles {
        chair: true,
        ..Roles::default()
    })
}

fn pc_member() -> Contact {
    Contact::new(2, "Pat", "Member").with_roles(Roles {
        pc: true,
        ..Roles::default()
    })
}

fn context(viewer: Contact, options: &ListOptions) -> ListContext {
    let settings = settings();
    ListContext::new(
        viewer,
        Arc::new(RolePolicy::new(Arc::clone(&settings))),
        settings,
    )
    .with_options(options)
}

fn render(
    registry: &ColumnRegistry,
    store: &dyn RecordStore,
    viewer: Contact,
    options: &ListOptions,
) -> RenderedList {
    let mut ctx = context(viewer, options);
    PaperList::new(registry, store)
        .render(&mut ctx, &options.columns)
        .expect("listing renders")
}

fn options(columns: &[&str], sort: &[&str]) -> ListOptions {
    ListOptions {
        columns: columns.iter().map(|name| name.to_string()).collect(),
        sort: sort.iter().map(|spec| spec.to_string()).collect(),
        ..ListOptions::default()
    }
}

fn summary(listing: &RenderedList) -> String {
    let names: Vec<&str> = listing
        .columns
        .iter()
        .map(|column| column.name.as_str())
        .collect();
    let mut lines = vec![format!("columns: {}", names.join(", "))];
    for row in &listing.rows {
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell| format!("{:?}", cell.text))
            .collect();
        lines.push(format!("{}: {}", row.paper_id, cells.join(", ")));
    }
    lines.join("\n")
}

#[test]
fn pc_member_listing_sorted_by_title() {
    let registry = build_default_registry(settings()).expect("registry");
    let store = MemoryStore::new(papers());
    let listing = render(
        &registry,
        &store,
        pc_member(),
        &options(&["id", "title", "status", "#accept"], &["title"]),
    );
    insta::assert_snapshot!(summary(&listing));
}

#[test]
fn hidden_decision_renders_empty_status() {
    let registry = build_default_registry(settings()).expect("registry");
    let store = MemoryStore::new(papers());
    let listing = render(
        &registry,
        &store,
        pc_member(),
        &options(&["id", "title", "status"], &[]),
    );
    assert_eq!(listing.paper_ids(), [PaperId(1), PaperId(2), PaperId(3)]);
    let status = listing.cell(PaperId(1), "status").expect("status cell");
    assert_eq!(status.content, None);
    assert_eq!(status.text, "Submitted");

    let listing = render(
        &registry,
        &store,
        chair(),
        &options(&["status"], &[]),
    );
    let status = listing.cell(PaperId(1), "status").expect("status cell");
    assert_eq!(status.text, "Accepted");
    assert!(
        status
            .content
            .as_deref()
            .is_some_and(|html| html.contains("pstat_decyes"))
    );
}

#[test]
fn names_resolve_ignoring_case_and_synonyms_share_columns() {
    let registry = build_default_registry(settings()).expect("registry");
    let mut errors = paperlist_core::ColumnErrors::new();
    let title = registry.lookup("TITLE", &mut errors).expect("title");
    assert_eq!(title.name(), "title");
    let pref = registry.lookup("pref", &mut errors).expect("pref");
    let revpref = registry.lookup("RevPref", &mut errors).expect("revpref");
    assert!(Arc::ptr_eq(&pref, &revpref));
    let first = registry.lookup("avg(OveMer) + 1", &mut errors).expect("formula");
    let second = registry.lookup("avg(OveMer) + 1", &mut errors).expect("formula");
    assert!(Arc::ptr_eq(&first, &second));
    assert!(errors.is_empty());
}

#[test]
fn reverse_sort_keeps_id_tie_break_ascending() {
    let registry = build_default_registry(settings()).expect("registry");
    let store = MemoryStore::new(papers());
    let listing = render(
        &registry,
        &store,
        pc_member(),
        &options(&["id"], &["-title"]),
    );
    assert_eq!(listing.paper_ids(), [PaperId(1), PaperId(2), PaperId(3)]);
    assert_eq!(listing.columns.len(), 1);
}

#[test]
fn unknown_columns_are_reported_and_skipped() {
    let registry = build_default_registry(settings()).expect("registry");
    let store = MemoryStore::new(papers());
    let listing = render(
        &registry,
        &store,
        pc_member(),
        &options(&["id", "bogus", "avg("], &["nosuchsort"]),
    );
    assert_eq!(listing.columns.len(), 1);
    assert_eq!(listing.errors.priority(), Some(1));
    assert_eq!(listing.errors.messages().len(), 1);

    let listing = render(
        &registry,
        &store,
        pc_member(),
        &options(&["bogus"], &[]),
    );
    assert_eq!(listing.errors.messages(), ["No such column “bogus”."]);
    assert_eq!(listing.rows.len(), 3);
    assert!(listing.rows.iter().all(|row| row.cells.is_empty()));

    let listing = render(
        &registry,
        &store,
        pc_member(),
        &options(&["id", "bogus"], &["nosuchsort"]),
    );
    assert_eq!(listing.errors.priority(), Some(0));
    assert_eq!(
        listing.errors.messages(),
        ["No such column “bogus”.", "No such sort column “nosuchsort”."]
    );
    assert_eq!(listing.paper_ids(), [PaperId(1), PaperId(2), PaperId(3)]);
}

#[test]
fn lead_and_shepherd_are_foldable_rows() {
    let registry = build_default_registry(settings()).expect("registry");
    let mut rows = papers();
    for row in &mut rows {
        if row.paper_id == PaperId(1) {
            row.lead_contact_id = Some(ContactId(2));
            row.shepherd_contact_id = Some(ContactId(2));
        }
    }
    let store = MemoryStore::new(rows);
    let mut request = options(&["id", "lead", "shepherd"], &[]);
    request.folded = vec!["LEAD".to_string()];
    let listing = render(&registry, &store, chair(), &request);

    let layout: Vec<(&str, bool, bool)> = listing
        .columns
        .iter()
        .map(|column| (column.name.as_str(), column.is_row, column.folded))
        .collect();
    assert_eq!(
        layout,
        [("id", false, false), ("lead", true, true), ("shepherd", true, false)]
    );
    let lead = listing.cell(PaperId(1), "lead").expect("lead cell");
    assert_eq!(lead.content, None);
    assert!(lead.text.is_empty());
    assert_eq!(listing.cell(PaperId(1), "shepherd").expect("shepherd cell").text, "#2");
}

#[test]
fn completion_offers_what_each_viewer_may_use() {
    let registry = build_default_registry(settings()).expect("registry");
    let names_for = |viewer: Contact| {
        let mut ctx = context(viewer, &ListOptions::default());
        registry.completion_names(&mut ctx)
    };
    let chair_names = names_for(chair());
    let pc_names = names_for(pc_member());

    for names in [&chair_names, &pc_names] {
        for expected in ["id", "title", "status", "revsubmitted", "lead", "shepherd", "#<tag>", "OveMer", "(<formula>)"] {
            assert!(names.iter().any(|name| name == expected), "missing {expected} in {names:?}");
        }
        for hidden in ["sel", "selconf", "assrev", "foldall", "numericorder"] {
            assert!(!names.iter().any(|name| name == hidden), "unexpected {hidden}");
        }
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), names.len(), "duplicate names in {names:?}");
    }

    for chair_only in ["desirability", "pcconf"] {
        assert!(chair_names.iter().any(|name| name == chair_only));
        assert!(!pc_names.iter().any(|name| name == chair_only));
    }
    assert!(pc_names.iter().all(|name| chair_names.contains(name)));
}

#[test]
fn editable_columns_queue_each_footer_hook_once() {
    let registry = build_default_registry(settings()).expect("registry");
    let store = MemoryStore::new(papers());
    let listing = render(
        &registry,
        &store,
        chair(),
        &options(&["edittag:urgent", "edit#accept", "editrevpref", "editpref", "id"], &[]),
    );
    assert_eq!(
        listing.footer_scripts,
        ["add_edittag_ajax()", "add_revpref_ajax(\".revpref\",1)"]
    );
    assert_eq!(listing.footer_html.len(), 1);
    assert!(listing.footer_html[0].contains("edittagajaxform"));
}

#[test]
fn scores_follow_review_visibility() {
    let registry = build_default_registry(settings()).expect("registry");
    let store = MemoryStore::new(papers());
    let listing = render(
        &registry,
        &store,
        pc_member(),
        &options(&["OveMer"], &[]),
    );
    assert_eq!(listing.columns[0].name, "overAllMerit");
    assert_eq!(listing.cell(PaperId(1), "OveMer").map(|cell| cell.text.as_str()), None);
    assert_eq!(listing.cell(PaperId(1), "overallmerit").expect("cell").text, "4 3");
    let conflicted = listing.cell(PaperId(2), "overallmerit").expect("cell");
    assert_eq!(conflicted.text, "");
    assert_eq!(conflicted.content, None);
    assert!(listing.query_options.is_set("scores"));
}

#[test]
fn formulas_hide_values_the_viewer_cannot_see() {
    let registry = build_default_registry(settings()).expect("registry");
    let store = MemoryStore::new(papers());
    let columns = options(&["id", "outcome + 1"], &[]);

    let listing = render(&registry, &store, pc_member(), &columns);
    let cell = &listing.rows[0].cells[1];
    assert_eq!(cell.content.as_deref(), Some("?"));
    assert_eq!(cell.text, "?");
    assert!(listing.statistics.is_empty());

    let listing = render(&registry, &store, chair(), &columns);
    assert_eq!(listing.rows[0].cells[1].text, "2");
    assert_eq!(listing.statistics.len(), 1);
    assert_eq!(
        listing.statistics[0].values[0],
        ("Count".to_string(), "3".to_string())
    );
}

#[test]
fn tag_content_and_text_agree() {
    let registry = build_default_registry(settings()).expect("registry");
    let store = MemoryStore::new(papers());
    for viewer in [chair(), pc_member()] {
        let listing = render(&registry, &store, viewer, &options(&["tag:urgent", "#accept"], &[]));
        for row in &listing.rows {
            for cell in &row.cells {
                assert_eq!(cell.content.is_some(), !cell.text.is_empty(), "paper {}", row.paper_id);
            }
        }
        assert_eq!(listing.cell(PaperId(1), "tag:urgent").expect("cell").text, "2");
        assert_eq!(listing.cell(PaperId(1), "#accept").expect("cell").text, "X");
        assert!(listing.query_options.is_set("tags"));
    }
}

#[test]
fn second_sorter_breaks_ties_then_id() {
    let registry = build_default_registry(settings()).expect("registry");
    let store = MemoryStore::new(papers());
    let listing = render(
        &registry,
        &store,
        chair(),
        &options(&["id"], &["#accept", "title"]),
    );
    assert_eq!(listing.paper_ids(), [PaperId(2), PaperId(1), PaperId(3)]);

    let listing = render(
        &registry,
        &store,
        chair(),
        &options(&["id"], &["#accept"]),
    );
    assert_eq!(listing.paper_ids(), [PaperId(1), PaperId(2), PaperId(3)]);
}

#[test]
fn folded_columns_render_no_cells() {
    let registry = build_default_registry(settings()).expect("registry");
    let store = MemoryStore::new(papers());
    let mut options = options(&["id", "abstract"], &[]);
    options.folded = vec!["abstract".to_string()];
    let listing = render(&registry, &store, chair(), &options);
    assert!(listing.columns[1].folded);
    assert!(listing.columns[1].is_row);
    assert!(listing.rows.iter().all(|row| row.cells[1].content.is_none()));
}

#[derive(Default)]
struct Calls {
    prepare: AtomicUsize,
    /// Every lifecycle call after `prepare`.
    later: AtomicUsize,
}

impl Calls {
    fn prepared(&self) -> usize {
        self.prepare.load(Ordering::SeqCst)
    }

    fn later(&self) -> usize {
        self.later.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.later.fetch_add(1, Ordering::SeqCst);
    }
}

struct Probe {
    meta: ColumnMeta,
    participate: bool,
    calls: Arc<Calls>,
}

impl Probe {
    fn new(name: &str, participate: bool) -> (Self, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let probe = Self {
            meta: ColumnMeta::new(name, ColumnFlags::VIEW_COLUMN),
            participate,
            calls: Arc::clone(&calls),
        };
        (probe, calls)
    }
}

impl PaperColumn for Probe {
    fn meta(&self) -> &ColumnMeta {
        &self.meta
    }

    fn kind(&self) -> ColumnKind {
        ColumnKind::NumericOrder
    }

    fn prepare(&self, _ctx: &mut ListContext, _state: &mut ColumnState, _level: PrepareLevel) -> bool {
        self.calls.prepare.fetch_add(1, Ordering::SeqCst);
        self.participate
    }

    fn analyze(
        &self,
        _ctx: &ListContext,
        _state: &mut ColumnState,
        _rows: &[PaperRow],
        _store: &dyn RecordStore,
    ) -> Result<(), StoreError> {
        self.calls.bump();
        Ok(())
    }

    fn sort_prepare(
        &self,
        _ctx: &ListContext,
        _state: &ColumnState,
        rows: &[PaperRow],
        _sorter: &Sorter,
    ) -> Vec<SortKey> {
        self.calls.bump();
        rows.iter().map(|_| SortKey::Null).collect()
    }

    fn header(&self, _ctx: &ListContext, _state: &ColumnState) -> String {
        self.calls.bump();
        self.name().to_string()
    }

    fn content_empty(&self, _ctx: &ListContext, _state: &ColumnState, _row: &PaperRow) -> bool {
        self.calls.bump();
        false
    }

    fn content(
        &self,
        ctx: &mut ListContext,
        _state: &mut ColumnState,
        _row: &PaperRow,
        _rowidx: usize,
    ) -> String {
        self.calls.bump();
        ctx.count.to_string()
    }

    fn text(&self, ctx: &ListContext, _state: &ColumnState, _row: &PaperRow) -> String {
        self.calls.bump();
        ctx.count.to_string()
    }
}

#[test]
fn columns_are_prepared_once_and_declined_columns_vanish() {
    let registry = build_default_registry(settings()).expect("registry");
    let (probe, probe_calls) = Probe::new("probe", true);
    let (shy, shy_calls) = Probe::new("shy", false);
    registry.register(probe, &[]).expect("register probe");
    registry.register(shy, &[]).expect("register shy");

    let store = MemoryStore::new(papers());
    let listing = render(
        &registry,
        &store,
        pc_member(),
        &options(&["probe", "shy", "PROBE"], &["shy", "probe"]),
    );
    assert_eq!(listing.columns.len(), 1);
    assert_eq!(probe_calls.prepared(), 1);
    assert_eq!(shy_calls.prepared(), 1);
    assert_eq!(shy_calls.later(), 0);
    // analyze, sort_prepare, header, then three calls per row
    assert_eq!(probe_calls.later(), 3 + 3 * 3);
    let counts: Vec<Option<&str>> = listing
        .rows
        .iter()
        .map(|row| row.cells[0].content.as_deref())
        .collect();
    assert_eq!(counts, [Some("1"), Some("2"), Some("3")]);
}

struct BrokenStore;

impl RecordStore for BrokenStore {
    fn fetch(&self, _options: &QueryOptions) -> Result<Vec<PaperRow>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn fetch_reviewer_rows(
        &self,
        _reviewer: ContactId,
        _papers: &[PaperId],
    ) -> Result<Vec<ReviewerRow>, StoreError> {
        Ok(Vec::new())
    }
}

#[test]
fn store_failures_abort_the_listing() {
    let registry = build_default_registry(settings()).expect("registry");
    let mut ctx = context(pc_member(), &ListOptions::default());
    let result = PaperList::new(&registry, &BrokenStore).render(&mut ctx, &["id".to_string()]);
    assert!(matches!(
        result,
        Err(ListError::Store(StoreError::Unavailable(_)))
    ));
}

#[test]
fn concurrent_listings_do_not_share_state() {
    let registry = build_default_registry(settings()).expect("registry");
    let store = MemoryStore::new(papers());
    let columns = options(&["id", "#accept", "merit", "outcome + 1"], &["title"]);
    let expected_pc = render(&registry, &store, pc_member(), &columns);
    let expected_chair = render(&registry, &store, chair(), &columns);

    thread::scope(|scope| {
        for round in 0..8 {
            let (registry, store, columns) = (&registry, &store, &columns);
            let (expected_pc, expected_chair) = (&expected_pc, &expected_chair);
            scope.spawn(move || {
                for _ in 0..10 {
                    if round % 2 == 0 {
                        assert_eq!(&render(registry, store, pc_member(), columns), expected_pc);
                    } else {
                        assert_eq!(
                            &render(registry, store, chair(), columns),
                            expected_chair
                        );
                    }
                }
            });
        }
    });
    assert_ne!(expected_pc.rows, expected_chair.rows);
}
