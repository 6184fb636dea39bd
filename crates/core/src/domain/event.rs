use crate::config::EventCategoryConfig;
use anyhow::ensure;
use std::fmt;

pub const EVENT_CATEGORY_COUNT: usize = 7;

/// Presence of each event category in one article, in category order E1..E7.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EventFlags([bool; EVENT_CATEGORY_COUNT]);

impl EventFlags {
    pub const NONE: Self = Self([false; EVENT_CATEGORY_COUNT]);

    pub fn get(&self, idx: usize) -> bool {
        self.0.get(idx).copied().unwrap_or(false)
    }

    /// 0/1 indicator values, ready to be written as E1..E7.
    pub fn indicators(&self) -> [u8; EVENT_CATEGORY_COUNT] {
        self.0.map(u8::from)
    }

    pub fn any(&self) -> bool {
        self.0.iter().any(|b| *b)
    }

    /// Parses the 7-character `'0'/'1'` form produced by `Display`.
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != EVENT_CATEGORY_COUNT {
            return None;
        }
        let mut bits = [false; EVENT_CATEGORY_COUNT];
        for (bit, b) in bits.iter_mut().zip(bytes) {
            *bit = match b {
                b'0' => false,
                b'1' => true,
                _ => return None,
            };
        }
        Some(Self(bits))
    }
}

impl fmt::Display for EventFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.0 {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct EventCategory {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Keyword-containment classifier over a fixed set of seven categories.
#[derive(Debug, Clone)]
pub struct EventClassifier {
    categories: Vec<EventCategory>,
}

impl EventClassifier {
    pub fn from_config(categories: &[EventCategoryConfig]) -> anyhow::Result<Self> {
        ensure!(
            categories.len() == EVENT_CATEGORY_COUNT,
            "exactly {EVENT_CATEGORY_COUNT} event categories are required (got {})",
            categories.len()
        );

        let categories: Vec<EventCategory> = categories
            .iter()
            .map(|c| EventCategory {
                name: c.name.clone(),
                // An empty needle would match every body.
                keywords: c
                    .keywords
                    .iter()
                    .filter(|k| !k.is_empty())
                    .cloned()
                    .collect(),
            })
            .collect();

        for (idx, category) in categories.iter().enumerate() {
            tracing::debug!(
                column = idx + 1,
                category = %category.name,
                keywords = category.keywords.len(),
                "event category loaded"
            );
        }

        Ok(Self { categories })
    }

    /// A category is present when any of its keywords occurs in the body.
    /// A missing body classifies as no events.
    pub fn classify(&self, body: Option<&str>) -> EventFlags {
        let Some(text) = body else {
            return EventFlags::NONE;
        };

        let mut bits = [false; EVENT_CATEGORY_COUNT];
        for (bit, category) in bits.iter_mut().zip(&self.categories) {
            *bit = category.keywords.iter().any(|k| text.contains(k.as_str()));
        }
        EventFlags(bits)
    }

    /// Output column names, `E1` through `E7`.
    pub fn indicator_columns() -> [String; EVENT_CATEGORY_COUNT] {
        std::array::from_fn(|i| format!("E{}", i + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use proptest::prelude::*;

    fn classifier() -> EventClassifier {
        EventClassifier::from_config(&PipelineConfig::default().event_categories).unwrap()
    }

    #[test]
    fn classifies_single_category() {
        let c = classifier();
        assert_eq!(c.classify(Some("대규모 공급계약 체결")).to_string(), "0100000");
        assert_eq!(c.classify(Some("특허 소송 제기")).to_string(), "0001001");
    }

    #[test]
    fn missing_body_is_all_zero() {
        let c = classifier();
        assert_eq!(c.classify(None), EventFlags::NONE);
        assert_eq!(c.classify(None).to_string(), "0000000");
    }

    #[test]
    fn body_without_keywords_is_all_zero() {
        let c = classifier();
        assert!(!c.classify(Some("오늘 날씨 맑음")).any());
    }

    #[test]
    fn parse_accepts_display_form_only() {
        let flags = EventFlags::parse("1000001").unwrap();
        assert!(flags.get(0) && flags.get(6) && !flags.get(3));
        assert_eq!(flags.indicators(), [1, 0, 0, 0, 0, 0, 1]);
        assert!(EventFlags::parse("100000").is_none());
        assert!(EventFlags::parse("10000x1").is_none());
    }

    #[test]
    fn indicator_columns_are_numbered_from_one() {
        let cols = EventClassifier::indicator_columns();
        assert_eq!(cols[0], "E1");
        assert_eq!(cols[6], "E7");
    }

    proptest! {
        #[test]
        fn bitmask_is_always_seven_binary_chars(body in ".{0,64}") {
            let rendered = classifier().classify(Some(&body)).to_string();
            prop_assert_eq!(rendered.len(), EVENT_CATEGORY_COUNT);
            prop_assert!(rendered.chars().all(|ch| ch == '0' || ch == '1'));
        }
    }
}
