//! Helpers shared across the backend-facing commands.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mirrorselect::backend::RestBackend;
use mirrorselect::http::ReqwestTransport;

use crate::config::Config;

/// Build the REST client from configuration.
pub(crate) fn build_client(config: &Config) -> Result<Arc<RestBackend>, Box<dyn std::error::Error>> {
    let base_url = config.backend_url()?.parse()?;
    let transport = Arc::new(ReqwestTransport::with_timeout(Duration::from_secs(
        config.sync.request_timeout_secs,
    ))?);

    let mut client = RestBackend::new(transport, base_url);
    if let Some(token) = &config.backend.token {
        client = client.with_token(token);
    }
    Ok(Arc::new(client))
}

/// Render a sync timestamp for table output.
pub(crate) fn format_sync_time(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "never".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn sync_time_renders_never_for_unsynced_hosts() {
        assert_eq!(format_sync_time(None), "never");
    }

    #[test]
    fn sync_time_renders_utc() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).single();
        assert_eq!(format_sync_time(at), "2024-05-01 12:30:00 UTC");
    }
}
