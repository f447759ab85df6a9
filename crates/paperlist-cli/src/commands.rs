use std::sync::Arc;

use anyhow::{Context, Result};
use paperlist_core::{ListContext, ListOptions, MemoryStore, PaperList, build_default_registry};
use paperlist_model::{CapabilityOracle, ConferenceSettings, Contact, RolePolicy};
use tracing::{info, info_span};

use paperlist_cli::input::{load_options, load_papers, load_settings, load_viewer};
use paperlist_cli::table::{listing_table, statistics_table};

use crate::cli::{ConferenceArgs, OutputFormatArg, RenderArgs};

fn load_conference(args: &ConferenceArgs) -> Result<(Arc<ConferenceSettings>, Contact)> {
    let settings = load_settings(&args.settings).context("load conference settings")?;
    let viewer = load_viewer(&args.viewer).context("load viewer")?;
    Ok((Arc::new(settings), viewer))
}

fn context(settings: &Arc<ConferenceSettings>, viewer: Contact, options: &ListOptions) -> ListContext {
    let oracle: Arc<dyn CapabilityOracle> = Arc::new(RolePolicy::new(Arc::clone(settings)));
    ListContext::new(viewer, oracle, Arc::clone(settings)).with_options(options)
}

/// Merges command-line flags into the options file.
fn merged_options(args: &RenderArgs) -> Result<ListOptions> {
    let mut options = load_options(args.options.as_deref())?;
    options.columns.extend(args.columns.iter().cloned());
    options.sort.extend(args.sort.iter().cloned());
    options.folded.extend(args.fold.iter().cloned());
    if let Some(limit) = &args.limit {
        options.search.limit.clone_from(limit);
    }
    Ok(options)
}

pub fn run_render(args: &RenderArgs) -> Result<bool> {
    let (settings, viewer) = load_conference(&args.conference)?;
    let span = info_span!("render", viewer = %viewer.contact_id);
    let _guard = span.enter();

    let options = merged_options(args)?;
    let papers = load_papers(&args.papers).context("load papers")?;
    let registry = build_default_registry(Arc::clone(&settings)).context("build column registry")?;
    let store = MemoryStore::new(papers);
    let mut ctx = context(&settings, viewer, &options);
    let listing = PaperList::new(&registry, &store)
        .render(&mut ctx, &options.columns)
        .context("render listing")?;
    info!(rows = listing.rows.len(), "listing ready");

    match args.format {
        OutputFormatArg::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&listing).context("serialize listing")?
            );
        }
        OutputFormatArg::Table => {
            println!("{}", listing_table(&listing));
            if let Some(table) = statistics_table(&listing) {
                println!("{table}");
            }
        }
    }
    for message in listing.errors.messages() {
        eprintln!("warning: {message}");
    }
    Ok(listing.errors.is_empty())
}

pub fn run_columns(args: &ConferenceArgs) -> Result<()> {
    let (settings, viewer) = load_conference(args)?;
    let registry = build_default_registry(Arc::clone(&settings)).context("build column registry")?;
    let mut ctx = context(&settings, viewer, &ListOptions::default());
    for name in registry.completion_names(&mut ctx) {
        println!("{name}");
    }
    Ok(())
}
