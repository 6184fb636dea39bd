use crate::domain::event::EVENT_CATEGORY_COUNT;
use anyhow::{ensure, Context};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything the pipeline stages need besides filesystem locations.
///
/// `Default` is the production deployment: ten KRX large caps, Korean news
/// archives and the FRED series the macro table is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub instruments: Vec<InstrumentConfig>,
    pub event_categories: Vec<EventCategoryConfig>,
    pub news: NewsSourceConfig,
    pub macro_table: MacroTableConfig,
    pub price: PriceSourceConfig,
    pub output: OutputConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub name: String,
    pub price_file: String,
    pub news_aliases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCategoryConfig {
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsSourceConfig {
    /// Archive extension, without the dot.
    pub extension: String,
    /// Lock/temp files written by spreadsheet editors start with this.
    pub temp_prefix: String,
    /// Accepted date headers, highest priority first.
    pub date_aliases: Vec<String>,
    pub body_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroTableConfig {
    pub date_column: String,
    pub drop_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceSourceConfig {
    pub date_column: String,
    pub close_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub date_label: String,
    pub count_label: String,
    pub target_label: String,
    pub file_suffix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub groups: Vec<SeriesGroup>,
}

/// A directory of fetched series, e.g. `fx` with `usd_krw -> DEXKOUS`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesGroup {
    pub name: String,
    pub series: Vec<SeriesRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesRef {
    pub name: String,
    pub series_id: String,
}

impl PipelineConfig {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read pipeline config {}", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .with_context(|| format!("invalid pipeline config JSON in {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.event_categories.len() == EVENT_CATEGORY_COUNT,
            "exactly {EVENT_CATEGORY_COUNT} event categories are required (got {})",
            self.event_categories.len()
        );
        for cat in &self.event_categories {
            ensure!(!cat.name.trim().is_empty(), "event category name must be non-empty");
            ensure!(
                cat.keywords.iter().any(|k| !k.is_empty()),
                "event category {} has no keywords",
                cat.name
            );
        }

        for inst in &self.instruments {
            ensure!(!inst.name.trim().is_empty(), "instrument name must be non-empty");
            ensure!(
                !inst.price_file.trim().is_empty(),
                "instrument {} has no price_file",
                inst.name
            );
        }

        ensure!(
            !self.news.date_aliases.is_empty(),
            "news.date_aliases must be non-empty"
        );
        ensure!(
            self.fetch.start <= self.fetch.end,
            "fetch.start {} is after fetch.end {}",
            self.fetch.start,
            self.fetch.end
        );
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let instruments = [
            ("Kia", "기아"),
            ("DoosanEnerbility", "두산에너빌리티"),
            ("SamsungBio", "삼성바이오로직스"),
            ("SamsungElectronics", "삼성전자"),
            ("HanwhaAerospace", "한화에어로스페이스"),
            ("HyundaiMotor", "현대차"),
            ("HDHyundaiHeavy", "HD현대중공업"),
            ("KBFinancial", "KB금융"),
            ("LGES", "LG에너지솔루션"),
            ("SKHynix", "SK하이닉스"),
        ]
        .into_iter()
        .map(|(name, alias)| InstrumentConfig {
            name: name.to_string(),
            price_file: format!("{name}.csv"),
            news_aliases: vec![alias.to_string()],
        })
        .collect();

        Self {
            instruments,
            event_categories: default_event_categories(),
            news: NewsSourceConfig::default(),
            macro_table: MacroTableConfig::default(),
            price: PriceSourceConfig::default(),
            output: OutputConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

fn default_event_categories() -> Vec<EventCategoryConfig> {
    let table: [(&str, &[&str]); EVENT_CATEGORY_COUNT] = [
        (
            "E1_EARN",
            &["실적", "영업이익", "컨센서스", "매출영업이익률", "어닝", "원가"],
        ),
        (
            "E2_ORDER",
            &["계약", "납품", "발주", "공급", "공급계약", "수주잔고", "납기"],
        ),
        (
            "E3_POLICY",
            &["정책", "규제", "정부", "법안", "제도", "행정", "감독", "공공", "당국"],
        ),
        (
            "E4_PRODUCT",
            &["개발", "기술", "공개", "상용화", "연구", "혁신", "특허"],
        ),
        (
            "E5_CAPEX",
            &["증설", "공장", "설비투자", "캐파", "신설", "이전", "생산라인"],
        ),
        (
            "E6_MA",
            &["인수", "합병", "M&A", "지분", "피인수", "흡수", "분할"],
        ),
        (
            "E7_RISK",
            &[
                "사고", "중단", "리콜", "결함", "안전사고", "생산중단", "회수", "품질이슈", "화재",
                "폭발", "벌금", "부도", "논란", "소송", "분쟁", "피해",
            ],
        ),
    ];

    table
        .into_iter()
        .map(|(name, keywords)| EventCategoryConfig {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        })
        .collect()
}

impl Default for NewsSourceConfig {
    fn default() -> Self {
        Self {
            extension: "xlsx".to_string(),
            temp_prefix: "~$".to_string(),
            date_aliases: ["일자", "Date", "date", "TIME", "time", "입력일", "작성일", "날짜"]
                .into_iter()
                .map(String::from)
                .collect(),
            body_column: "본문".to_string(),
        }
    }
}

impl Default for MacroTableConfig {
    fn default() -> Self {
        Self {
            date_column: "date".to_string(),
            drop_columns: vec!["kor_3y".to_string()],
        }
    }
}

impl Default for PriceSourceConfig {
    fn default() -> Self {
        Self {
            date_column: "Date".to_string(),
            close_column: "Close".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            date_label: "Date".to_string(),
            count_label: "x1".to_string(),
            target_label: "y(stock)".to_string(),
            file_suffix: "_final.csv".to_string(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        let group = |name: &str, series: &[(&str, &str)]| SeriesGroup {
            name: name.to_string(),
            series: series
                .iter()
                .map(|(name, id)| SeriesRef {
                    name: name.to_string(),
                    series_id: id.to_string(),
                })
                .collect(),
        };

        Self {
            start: NaiveDate::from_ymd_opt(2024, 12, 9).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2025, 12, 9).unwrap_or_default(),
            groups: vec![
                group(
                    "fx",
                    &[
                        ("usd_krw", "DEXKOUS"),
                        ("jpy_usd", "DEXJPUS"),
                        ("eur_usd", "DEXUSEU"),
                        ("gbp_usd", "DEXUSUK"),
                    ],
                ),
                group(
                    "commodity",
                    &[("wti", "DCOILWTICO"), ("gold", "GOLDPMGBD228NLBM")],
                ),
                group(
                    "rate",
                    &[("kor_3y", "IRLTLT01KRM156N"), ("us_1m", "DGS1MO")],
                ),
                group("macro", &[("vix", "VIXCLS")]),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = PipelineConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.instruments.len(), 10);
        assert_eq!(cfg.instruments[0].price_file, "Kia.csv");
        assert_eq!(cfg.event_categories[6].name, "E7_RISK");
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: PipelineConfig = serde_json::from_str(
            r#"{"instruments":[{"name":"Kia","price_file":"Kia.csv","news_aliases":["기아"]}]}"#,
        )
        .unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.instruments.len(), 1);
        assert_eq!(cfg.news.body_column, "본문");
        assert_eq!(cfg.output.target_label, "y(stock)");
    }

    #[test]
    fn rejects_wrong_category_count() {
        let mut cfg = PipelineConfig::default();
        cfg.event_categories.pop();
        assert!(cfg.validate().is_err());
    }
}
