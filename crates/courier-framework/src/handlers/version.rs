//! `/version`

use chrono::{DateTime, Local, TimeZone};
use tracing::debug;

use courier_core::{BuildInfo, DEFAULT_UPDATE_INFO_URL, SendOutcome, Session};

use super::Invocation;
use crate::error::CommandResult;

/// Formats a time the way `en-US` locales print date-times
/// (`1/2/2024, 3:04:05 PM`).
pub fn format_time<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

fn local_time(timestamp: i64) -> String {
    match Local.timestamp_opt(timestamp, 0).single() {
        Some(time) => format_time(&time),
        None => timestamp.to_string(),
    }
}

fn describe(build: &BuildInfo) -> String {
    format!("{}({})", build.sha, local_time(build.timestamp))
}

pub(super) async fn check_update(inv: &Invocation<'_>, session: &mut Session) -> CommandResult<SendOutcome> {
    let url = match inv.settings.update_info_url.as_str() {
        "" => DEFAULT_UPDATE_INFO_URL,
        url => url,
    };

    let current = &inv.settings.build;
    let online: BuildInfo = serde_json::from_value(inv.services.fetcher.get_json(url).await?)?;
    debug!(current = current.timestamp, online = online.timestamp, "Fetched build info");

    let text = if current.timestamp < online.timestamp {
        format!(
            "New version detected: {}\nCurrent version: {}",
            describe(&online),
            describe(current)
        )
    } else {
        format!("Current version: {} is up to date", describe(current))
    };
    Ok(inv.reply(session, &text).await)
}
