//! The `repos` command: list the affiliated catalog and current selection.

use console::style;
use mirrorselect::selection::CatalogRepo;
use mirrorselect::workflow::{PageData, load_page};

use crate::commands::shared::build_client;
use crate::commands::status::{OutputFormat, print_rows};
use crate::config::Config;

/// One catalog row.
#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
pub(crate) struct RepoDisplay {
    #[tabled(rename = "Sel")]
    pub selected: String,
    #[tabled(rename = "Repository")]
    pub name: String,
    #[tabled(rename = "Visibility")]
    pub visibility: String,
    #[tabled(rename = "Mirror")]
    pub mirror: String,
}

impl RepoDisplay {
    fn from_entry(entry: &CatalogRepo, selected: bool) -> Self {
        let mirror = match &entry.mirror {
            Some(m) if m.clone_in_progress => "cloning".to_string(),
            Some(m) if m.cloned => "cloned".to_string(),
            Some(_) => "queued".to_string(),
            None => "-".to_string(),
        };
        Self {
            selected: if selected { "✓".to_string() } else { String::new() },
            name: entry.name().to_string(),
            visibility: if entry.repo.private { "private" } else { "public" }.to_string(),
            mirror,
        }
    }
}

pub(crate) async fn handle_repos(
    config: &Config,
    filter: Option<&str>,
    private_only: bool,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_client(config)?;
    let principal = config.principal()?;

    let data = load_page(client.as_ref(), principal, config.sync.allow_sync_all).await?;
    if data.hosts.is_empty() {
        println!("No code hosts configured for {principal}.");
        return Ok(());
    }

    print_problems(&data);

    let rows = catalog_rows(&data, filter, private_only);
    if rows.is_empty() {
        match filter {
            Some(f) => println!("No affiliated repositories match \"{f}\"."),
            None => println!("No affiliated repositories."),
        }
        return Ok(());
    }
    print_rows(&rows, output)?;

    println!(
        "\nMode: {}  ({} of {} selected)",
        data.selection.mode().as_str(),
        data.selection.selected_count(),
        data.selection.catalog().len(),
    );
    if !data.public.repos().is_empty() {
        let state = if data.public.enabled { "on" } else { "off" };
        println!("Public repositories ({state}):");
        for repo in data.public.repos() {
            println!("  {repo}");
        }
    }
    Ok(())
}

fn catalog_rows(data: &PageData, filter: Option<&str>, private_only: bool) -> Vec<RepoDisplay> {
    data.selection
        .catalog()
        .iter()
        .filter(|entry| filter.is_none_or(|f| entry.name().contains(f)))
        .filter(|entry| !private_only || entry.repo.private)
        .map(|entry| RepoDisplay::from_entry(entry, data.selection.is_selected(entry.name())))
        .collect()
}

fn print_problems(data: &PageData) {
    for problem in &data.problems.hosts {
        eprintln!("{} {problem}", style("⚠").yellow());
    }
    if let Some(message) = &data.problems.public_error {
        eprintln!(
            "{} public repositories unavailable: {message}",
            style("⚠").yellow()
        );
    }
}
