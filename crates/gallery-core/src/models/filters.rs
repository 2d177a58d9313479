//! Query filters for listing images.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Filters accepted by `GET /images`.
///
/// Empty vectors and `None` bounds mean "not filtered on that dimension".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFilters {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

impl ImageFilters {
    /// No filtering: every image.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn category(category: impl Into<String>) -> Self {
        Self::default().with_category(category)
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Self::default().with_tag(tag)
    }

    pub fn date_range(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self {
            start_date: start,
            end_date: end,
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_start_date(mut self, start: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self
    }

    pub fn with_end_date(mut self, end: DateTime<Utc>) -> Self {
        self.end_date = Some(end);
        self
    }

    /// True when no dimension is filtered.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && self.tags.is_empty()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }

    pub fn has_date_bound(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }

    /// Query-string pairs for the list endpoint.
    ///
    /// Categories and tags are comma-joined; dates use millisecond ISO-8601.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.categories.is_empty() {
            pairs.push(("category", self.categories.join(",")));
        }
        if !self.tags.is_empty() {
            pairs.push(("tags", self.tags.join(",")));
        }
        if let Some(start) = self.start_date {
            pairs.push(("startDate", iso_millis(&start)));
        }
        if let Some(end) = self.end_date {
            pairs.push(("endDate", iso_millis(&end)));
        }
        pairs
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn iso_millis(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_empty_filters() {
        assert!(ImageFilters::all().is_empty());
        assert!(ImageFilters::all().to_query_pairs().is_empty());
        assert!(!ImageFilters::category("nature").is_empty());
    }

    #[test]
    fn test_query_pairs_join_lists() {
        let filters = ImageFilters::category("nature")
            .with_category("city")
            .with_tag("sky");
        let pairs = filters.to_query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("category", "nature,city".to_string()),
                ("tags", "sky".to_string())
            ]
        );
    }

    #[test]
    fn test_query_pairs_dates() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let filters = ImageFilters::date_range(Some(start), None);
        assert_eq!(
            filters.to_query_pairs(),
            vec![("startDate", "2024-01-01T00:00:00.000Z".to_string())]
        );
        assert!(filters.has_date_bound());
    }
}
