//! Shared Socrata SODA API fetcher.
//!
//! Handles paginated fetching from a Socrata dataset using the `$limit`,
//! `$offset`, `$order`, and `$where` query parameters. Records are returned
//! in memory; nothing is written to disk.

use crate::parsing::format_socrata_date;
use crate::{FetchWindow, SourceError, retry};

/// Configuration for a Socrata fetch operation.
pub struct SocrataConfig<'a> {
    /// Base API URL (e.g., `"https://data.cityofnewyork.us/resource/erm2-nwe9.json"`).
    pub api_url: &'a str,
    /// The date column used for ordering and window filtering.
    pub date_column: &'a str,
    /// Label for log messages (e.g., `"NYC 311"`).
    pub label: &'a str,
    /// Page size for pagination.
    pub page_size: u64,
    /// Stop after this many records. `None` fetches the whole window.
    pub max_records: Option<u64>,
    /// Optional Socrata application token (sent as `X-App-Token`).
    pub app_token: Option<&'a str>,
}

/// Builds a `$where` clause selecting `window` on `date_column`, optionally
/// narrowed by `column = 'value'` equality filters.
#[must_use]
pub fn build_where(date_column: &str, window: &FetchWindow, equals: &[(&str, &str)]) -> String {
    let mut clauses = vec![format!(
        "{date_column} between '{}' and '{}'",
        format_socrata_date(&window.start),
        format_socrata_date(&window.end)
    )];
    for (column, value) in equals {
        clauses.push(format!("{column} = '{}'", value.replace('\'', "''")));
    }
    clauses.join(" AND ")
}

/// Fetches every record matching `where_clause`, page by page.
///
/// # Errors
///
/// Returns [`SourceError`] if any page request fails or a page is not a
/// JSON array.
pub async fn fetch_socrata(
    client: &reqwest::Client,
    config: &SocrataConfig<'_>,
    where_clause: &str,
) -> Result<Vec<serde_json::Value>, SourceError> {
    let mut all_records: Vec<serde_json::Value> = Vec::new();
    let mut offset: u64 = 0;
    let fetch_limit = config.max_records.unwrap_or(u64::MAX);
    let order = format!("{} DESC", config.date_column);

    loop {
        let remaining = fetch_limit.saturating_sub(offset);
        if remaining == 0 {
            break;
        }
        let page_limit = remaining.min(config.page_size);
        let limit_str = page_limit.to_string();
        let offset_str = offset.to_string();

        log::info!(
            "Fetching {} data: offset={offset}, limit={page_limit}",
            config.label
        );
        let body = retry::send_json(|| {
            let request = client.get(config.api_url).query(&[
                ("$limit", limit_str.as_str()),
                ("$offset", offset_str.as_str()),
                ("$order", order.as_str()),
                ("$where", where_clause),
            ]);
            match config.app_token {
                Some(token) => request.header("X-App-Token", token),
                None => request,
            }
        })
        .await?;

        let serde_json::Value::Array(records) = body else {
            return Err(SourceError::Normalization {
                message: format!("{} response is not a JSON array", config.label),
            });
        };

        let count = records.len() as u64;
        if count == 0 {
            break;
        }

        all_records.extend(records);
        offset += count;

        if count < page_limit {
            break;
        }
    }

    log::info!(
        "Downloaded {} {} records total",
        all_records.len(),
        config.label
    );
    Ok(all_records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse_socrata_date;

    fn window() -> FetchWindow {
        FetchWindow {
            start: parse_socrata_date("2024-01-01T00:00:00").unwrap(),
            end: parse_socrata_date("2024-07-01T00:00:00").unwrap(),
        }
    }

    #[test]
    fn builds_window_only_where_clause() {
        let clause = build_where("created_date", &window(), &[]);
        assert_eq!(
            clause,
            "created_date between '2024-01-01T00:00:00' and '2024-07-01T00:00:00'"
        );
    }

    #[test]
    fn builds_where_clause_with_equality_filter() {
        let clause = build_where("created_date", &window(), &[("borough", "STATEN ISLAND")]);
        assert!(clause.ends_with(" AND borough = 'STATEN ISLAND'"));
    }

    #[test]
    fn escapes_quotes_in_filter_values() {
        let clause = build_where("created_date", &window(), &[("borough", "O'BRIEN")]);
        assert!(clause.ends_with("borough = 'O''BRIEN'"));
    }
}
