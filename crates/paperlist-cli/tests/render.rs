//! Loading fixture files and rendering them as terminal tables.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use paperlist_cli::input::{load_options, load_papers, load_settings, load_viewer};
use paperlist_cli::table::{listing_table, statistics_table};
use paperlist_core::{ListContext, MemoryStore, PaperList, build_default_registry};
use paperlist_model::RolePolicy;

const SETTINGS: &str = r#"
name = "Workshop"

[[review_fields]]
id = "overAllMerit"
name = "Overall merit"
abbreviation = "OveMer"
options = ["Reject", "Weak reject", "Weak accept", "Accept"]
display_order = 1

[[formulas]]
id = 1
name = "Merit"
expression = "avg(OveMer)"
"#;

const PAPERS: &str = r#"[
  {
    "paper_id": 2,
    "title": "Viewstamped Replication",
    "time_submitted": 10,
    "reviews": [
      {"contact_id": 10, "review_type": 3, "submitted": true, "scores": {"overAllMerit": 4}},
      {"contact_id": 11, "review_type": 3, "submitted": true, "scores": {"overAllMerit": 2}}
    ]
  },
  {"paper_id": 1, "title": "Chain Replication", "time_submitted": 12}
]"#;

const CHAIR: &str = r#"{"contact_id": 1, "first_name": "Ada", "last_name": "Chair", "roles": {"chair": true}}"#;

const OPTIONS: &str = r#"{"columns": ["id", "title", "merit"], "sort": ["title"]}"#;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

#[test]
fn renders_fixture_files_as_a_table() {
    let temp = TempDir::new().expect("temp dir");
    let dir = temp.path();
    let settings = Arc::new(load_settings(&write(dir, "settings.toml", SETTINGS)).expect("settings"));
    let papers = load_papers(&write(dir, "papers.json", PAPERS)).expect("papers");
    let viewer = load_viewer(&write(dir, "viewer.json", CHAIR)).expect("viewer");
    let options_path = write(dir, "options.json", OPTIONS);
    let options = load_options(Some(options_path.as_path())).expect("options");

    let registry = build_default_registry(Arc::clone(&settings)).expect("registry");
    let store = MemoryStore::new(papers);
    let mut ctx = ListContext::new(
        viewer,
        Arc::new(RolePolicy::new(Arc::clone(&settings))),
        Arc::clone(&settings),
    )
    .with_options(&options);
    let listing = PaperList::new(&registry, &store)
        .render(&mut ctx, &options.columns)
        .expect("listing");

    let ids: Vec<u32> = listing.rows.iter().map(|row| row.paper_id.0).collect();
    assert_eq!(ids, [1, 2]);

    let table = listing_table(&listing).to_string();
    assert!(table.contains("Chain Replication"));
    assert!(table.contains("Viewstamped Replication"));
    assert!(table.contains("formula1"));

    let footer = statistics_table(&listing).expect("merit has statistics").to_string();
    assert!(footer.contains("Count"));
    assert!(footer.contains('3'));
}

#[test]
fn malformed_papers_are_reported_with_their_path() {
    let temp = TempDir::new().expect("temp dir");
    let path = write(temp.path(), "papers.json", "{not json");
    let error = load_papers(&path).expect_err("malformed");
    let message = format!("{error:#}");
    assert!(message.contains("parse papers"));
    assert!(message.contains("papers.json"));
}
