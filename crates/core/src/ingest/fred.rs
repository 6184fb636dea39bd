use crate::config::{FetchConfig, Settings};
use crate::ingest::types::{ObservationsResponse, SeriesPoint};
use crate::tabular::{format_value, write_csv};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.stlouisfed.org";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const OBSERVATIONS_PATH: &str = "/fred/series/observations";

#[async_trait::async_trait]
pub trait MacroSeriesClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_series(
        &self,
        series_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SeriesPoint>>;
}

#[derive(Debug, Clone)]
pub struct FredClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FredClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_fred_api_key()?.to_string();
        let base_url = settings
            .fred_base_url
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = settings.fred_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build FRED http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), OBSERVATIONS_PATH)
    }
}

#[async_trait::async_trait]
impl MacroSeriesClient for FredClient {
    fn provider_name(&self) -> &'static str {
        "fred"
    }

    async fn fetch_series(
        &self,
        series_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SeriesPoint>> {
        let start = start.to_string();
        let end = end.to_string();
        let res = self
            .http
            .get(self.url())
            .query(&[
                ("series_id", series_id),
                ("api_key", self.api_key.as_str()),
                ("file_type", "json"),
                ("observation_start", start.as_str()),
                ("observation_end", end.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("FRED request failed for {series_id}"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read FRED response")?;
        if !status.is_success() {
            anyhow::bail!("FRED HTTP {status} for {series_id}: {text}");
        }

        parse_observations(&text)
            .with_context(|| format!("unexpected FRED payload for {series_id}"))
    }
}

pub fn parse_observations(text: &str) -> Result<Vec<SeriesPoint>> {
    let parsed = serde_json::from_str::<ObservationsResponse>(text)
        .context("FRED response is not valid observations JSON")?;
    Ok(parsed.observations.iter().map(SeriesPoint::from).collect())
}

#[derive(Debug, Clone, Default)]
pub struct FetchSummary {
    pub saved: Vec<PathBuf>,
    pub failed: Vec<String>,
}

/// Fetches every configured series into `<data_dir>/<group>/<name>.csv`
/// (`Date,Value,Name`). A failing series is logged and skipped.
pub async fn fetch_and_save_groups(
    client: &dyn MacroSeriesClient,
    data_dir: &Path,
    fetch: &FetchConfig,
) -> Result<FetchSummary> {
    let mut summary = FetchSummary::default();

    for group in &fetch.groups {
        let dir = data_dir.join(&group.name);
        for series in &group.series {
            let result = client
                .fetch_series(&series.series_id, fetch.start, fetch.end)
                .await
                .and_then(|points| {
                    let path = dir.join(format!("{}.csv", series.name));
                    write_series_csv(&path, &series.name, &points)?;
                    Ok((path, points.len()))
                });

            match result {
                Ok((path, points)) => {
                    tracing::info!(
                        provider = client.provider_name(),
                        group = %group.name,
                        series = %series.name,
                        series_id = %series.series_id,
                        points,
                        "macro series saved"
                    );
                    summary.saved.push(path);
                }
                Err(err) => {
                    tracing::warn!(
                        provider = client.provider_name(),
                        series = %series.name,
                        series_id = %series.series_id,
                        error = %format!("{err:#}"),
                        "macro series fetch failed; skipping"
                    );
                    summary.failed.push(series.name.clone());
                }
            }
        }
    }

    Ok(summary)
}

fn write_series_csv(path: &Path, name: &str, points: &[SeriesPoint]) -> Result<usize> {
    let header = ["Date", "Value", "Name"].map(String::from);
    write_csv(
        path,
        &header,
        points.iter().map(|p| {
            vec![
                p.date.format("%Y-%m-%d").to_string(),
                format_value(p.value),
                name.to_string(),
            ]
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SeriesGroup, SeriesRef};
    use serde_json::json;

    #[test]
    fn parses_observations_and_missing_marker() {
        let body = json!({
            "realtime_start": "2025-01-01",
            "observations": [
                {"realtime_start": "2025-01-01", "date": "2025-01-02", "value": "1450.25"},
                {"realtime_start": "2025-01-01", "date": "2025-01-03", "value": "."}
            ]
        })
        .to_string();

        let points = parse_observations(&body).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].value, Some(1450.25));
        assert_eq!(points[1].value, None);
    }

    #[test]
    fn rejects_error_payload() {
        assert!(parse_observations(r#"{"observations": "nope"}"#).is_err());
    }

    struct FakeClient;

    #[async_trait::async_trait]
    impl MacroSeriesClient for FakeClient {
        fn provider_name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_series(
            &self,
            series_id: &str,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<SeriesPoint>> {
            anyhow::ensure!(series_id != "BROKEN", "upstream 500");
            Ok(vec![
                SeriesPoint { date: start, value: Some(1.5) },
                SeriesPoint { date: start.succ_opt().unwrap(), value: None },
            ])
        }
    }

    #[tokio::test]
    async fn failing_series_does_not_stop_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let fetch = FetchConfig {
            start: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
            groups: vec![SeriesGroup {
                name: "fx".into(),
                series: vec![
                    SeriesRef { name: "broken".into(), series_id: "BROKEN".into() },
                    SeriesRef { name: "usd_krw".into(), series_id: "DEXKOUS".into() },
                ],
            }],
        };

        let summary = fetch_and_save_groups(&FakeClient, dir.path(), &fetch).await.unwrap();
        assert_eq!(summary.failed, vec!["broken".to_string()]);
        assert_eq!(summary.saved.len(), 1);

        let text = std::fs::read_to_string(dir.path().join("fx/usd_krw.csv")).unwrap();
        assert_eq!(text, "Date,Value,Name\n2025-01-02,1.5,usd_krw\n2025-01-03,,usd_krw\n");
    }
}
