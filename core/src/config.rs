use crate::types::{Period, Price, DEFAULT_PRICE, OVERRIDE_NAMESPACE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_price() -> Price { DEFAULT_PRICE }
fn default_namespace() -> String { OVERRIDE_NAMESPACE.into() }

#[derive(Debug, Clone, Deserialize)]
struct ReportConfigFile {
    #[serde(default = "default_price")]
    default_price: Price,
    #[serde(default = "default_namespace")]
    override_namespace: String,
    /// Keys are month numbers as strings ("1" .. "12").
    #[serde(default)]
    period_labels: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub default_price:      Price,
    pub override_namespace: String,
    pub period_labels:      HashMap<Period, String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_price:      DEFAULT_PRICE,
            override_namespace: OVERRIDE_NAMESPACE.into(),
            period_labels:      default_period_labels(),
        }
    }
}

impl ReportConfig {
    /// Load from `<data_dir>/report_config.json`.
    /// In tests, use ReportConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/report_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let file: ReportConfigFile = serde_json::from_str(content)?;

        if !crate::types::is_valid_price(file.default_price) {
            anyhow::bail!("default_price must be >= 0, got {}", file.default_price);
        }

        let mut period_labels = default_period_labels();
        for (key, label) in file.period_labels {
            let period: Period = key
                .parse()
                .map_err(|e| anyhow::anyhow!("Bad period label key '{key}': {e}"))?;
            period_labels.insert(period, label);
        }

        Ok(Self {
            default_price:      file.default_price,
            override_namespace: file.override_namespace,
            period_labels,
        })
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self::default()
    }

    /// "1st" .. "12th" for known months, "Month N" otherwise.
    pub fn period_label(&self, period: Period) -> String {
        self.period_labels
            .get(&period)
            .cloned()
            .unwrap_or_else(|| format!("Month {period}"))
    }
}

fn default_period_labels() -> HashMap<Period, String> {
    (1..=12)
        .map(|m: Period| {
            let suffix = match m {
                1 => "st",
                2 => "nd",
                3 => "rd",
                _ => "th",
            };
            (m, format!("{m}{suffix}"))
        })
        .collect()
}
