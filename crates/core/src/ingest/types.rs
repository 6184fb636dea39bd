use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// FRED `series/observations` response, reduced to what we keep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationsResponse {
    #[serde(default)]
    pub observations: Vec<Observation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: String,
}

impl Observation {
    /// FRED writes `"."` for days without a value.
    pub fn value_f64(&self) -> Option<f64> {
        let t = self.value.trim();
        if t.is_empty() || t == "." {
            return None;
        }
        t.parse::<f64>().ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl From<&Observation> for SeriesPoint {
    fn from(o: &Observation) -> Self {
        Self {
            date: o.date,
            value: o.value_f64(),
        }
    }
}
