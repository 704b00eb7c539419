//! The `status` command: show code hosts and their sync state.

use clap::ValueEnum;
use mirrorselect::backend::{BackendClient, CodeHost};
use tabled::Table;
use tabled::settings::Style;

use crate::commands::shared::{build_client, format_sync_time};
use crate::config::Config;

/// Output format for tabular commands.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// One code host row.
#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
pub(crate) struct HostDisplay {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Repos")]
    pub repos: u64,
    #[tabled(rename = "Last Synced")]
    pub last_synced: String,
    #[tabled(rename = "Problem")]
    pub problem: String,
}

impl HostDisplay {
    fn from_host(host: &CodeHost) -> Self {
        Self {
            name: host.display_name.clone(),
            kind: host.kind.as_str().to_string(),
            repos: host.repo_count,
            last_synced: format_sync_time(host.last_sync_at),
            problem: host.problem().unwrap_or("-").to_string(),
        }
    }
}

pub(crate) async fn handle_status(
    config: &Config,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_client(config)?;
    let principal = config.principal()?;

    let hosts = client.list_code_hosts(principal).await?;
    if hosts.is_empty() {
        println!("No code hosts configured for {principal}.");
        return Ok(());
    }

    let rows: Vec<HostDisplay> = hosts.iter().map(HostDisplay::from_host).collect();
    print_rows(&rows, output)?;
    Ok(())
}

pub(crate) fn print_rows<T>(
    rows: &[T],
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>>
where
    T: serde::Serialize + tabled::Tabled,
{
    match output {
        OutputFormat::Table => {
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(rows)?);
        }
    }
    Ok(())
}
