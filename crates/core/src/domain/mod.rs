pub mod event;
pub mod rows;

pub use event::{EventClassifier, EventFlags, EVENT_CATEGORY_COUNT};
pub use rows::{FeatureTable, FinalRow, MacroTable, NewsArticle, NewsDailyFeature, ReturnRow};
