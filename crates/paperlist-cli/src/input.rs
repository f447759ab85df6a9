//! Loading settings, records, and viewers from disk.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use paperlist_core::ListOptions;
use paperlist_model::{ConferenceSettings, Contact, PaperRow};
use serde::de::DeserializeOwned;
use tracing::debug;

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read {what} from {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse {what} in {}", path.display()))
}

pub fn load_settings(path: &Path) -> Result<ConferenceSettings> {
    let settings = ConferenceSettings::load(path)?;
    debug!(
        path = %path.display(),
        review_fields = settings.review_fields.len(),
        formulas = settings.formulas.len(),
        "loaded settings"
    );
    Ok(settings)
}

/// Reads a JSON array of submissions.
pub fn load_papers(path: &Path) -> Result<Vec<PaperRow>> {
    let papers: Vec<PaperRow> = read_json(path, "papers")?;
    debug!(path = %path.display(), papers = papers.len(), "loaded papers");
    Ok(papers)
}

pub fn load_viewer(path: &Path) -> Result<Contact> {
    read_json(path, "viewer")
}

/// Reads listing options; a missing path means defaults.
pub fn load_options(path: Option<&Path>) -> Result<ListOptions> {
    match path {
        Some(path) => read_json(path, "listing options"),
        None => Ok(ListOptions::default()),
    }
}
