use crate::domain::{parse_iso_date, Conference};
use crate::error::Result;
use chrono::NaiveDate;

/// Conjunctive predicates over a conference list. Unset fields match
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConferenceFilter {
    /// Case-insensitive substring of any topic or of the name.
    pub topic: Option<String>,
    /// Case-insensitive substring of the country.
    pub country: Option<String>,
    /// Keep conferences ending on or after this ISO date.
    pub after: Option<String>,
    /// Keep conferences starting on or before this ISO date.
    pub before: Option<String>,
}

impl ConferenceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn after(mut self, after: impl Into<String>) -> Self {
        self.after = Some(after.into());
        self
    }

    pub fn before(mut self, before: impl Into<String>) -> Self {
        self.before = Some(before.into());
        self
    }

    /// Filter and sort by start date ascending. The sort is stable, so
    /// conferences starting the same day keep their merge order.
    ///
    /// Fails with [`crate::error::ConfradarError::InvalidDate`] when
    /// `after` or `before` is not an ISO date. Conferences whose own dates
    /// do not parse never satisfy a date bound and sort last.
    pub fn apply(&self, items: &[Conference]) -> Result<Vec<Conference>> {
        let after = parse_bound(self.after.as_deref())?;
        let before = parse_bound(self.before.as_deref())?;
        let topic = non_empty_lower(self.topic.as_deref());
        let country = non_empty_lower(self.country.as_deref());

        let mut result: Vec<Conference> = items
            .iter()
            .filter(|c| topic.as_deref().map_or(true, |t| matches_topic(c, t)))
            .filter(|c| country.as_deref().map_or(true, |ctry| c.country.to_lowercase().contains(ctry)))
            .filter(|c| after.map_or(true, |a| c.end_dt().map_or(false, |end| end >= a)))
            .filter(|c| before.map_or(true, |b| c.start_dt().map_or(false, |start| start <= b)))
            .cloned()
            .collect();

        result.sort_by_key(|c| {
            let start = c.start_dt().ok();
            (start.is_none(), start)
        });
        Ok(result)
    }
}

/// Convenience wrapper around [`ConferenceFilter::apply`].
pub fn filter_conferences(
    items: &[Conference],
    topic: Option<&str>,
    country: Option<&str>,
    after: Option<&str>,
    before: Option<&str>,
) -> Result<Vec<Conference>> {
    ConferenceFilter {
        topic: topic.map(str::to_string),
        country: country.map(str::to_string),
        after: after.map(str::to_string),
        before: before.map(str::to_string),
    }
    .apply(items)
}

fn matches_topic(conference: &Conference, needle: &str) -> bool {
    conference
        .topics
        .iter()
        .any(|t| t.to_lowercase().contains(needle))
        || conference.name.to_lowercase().contains(needle)
}

// An empty filter value is treated as unset.
fn non_empty_lower(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_lowercase)
}

fn parse_bound(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .filter(|v| !v.is_empty())
        .map(parse_iso_date)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfradarError;

    fn conference(name: &str, start: &str, end: &str, country: &str, topics: &[&str]) -> Conference {
        Conference {
            name: name.to_string(),
            start_date: start.to_string(),
            end_date: end.to_string(),
            city: "X".to_string(),
            country: country.to_string(),
            url: "https://example.com".to_string(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn names(confs: &[Conference]) -> Vec<&str> {
        confs.iter().map(|c| c.name.as_str()).collect()
    }

    fn sample() -> Vec<Conference> {
        vec![
            conference("JSConf", "2025-02-01", "2025-02-03", "Y", &["javascript"]),
            conference("PyCon", "2025-01-01", "2025-01-03", "Y", &["python"]),
            conference("AI Summit", "2025-03-10", "2025-03-11", "Online", &["ai"]),
            conference("Data Days", "2025-04-01", "2025-04-02", "Online", &["data"]),
            conference("ML Live", "2025-05-01", "2025-05-01", "Germany", &["AI", "ml"]),
        ]
    }

    #[test]
    fn test_topic_filter_matches_topics() {
        let out = ConferenceFilter::new().topic("python").apply(&sample()[..2]).unwrap();
        assert_eq!(names(&out), vec!["PyCon"]);
    }

    #[test]
    fn test_topic_filter_matches_name_case_insensitively() {
        let items = vec![conference("Strange Loop", "2025-01-01", "2025-01-01", "USA", &[])];
        let out = ConferenceFilter::new().topic("LOOP").apply(&items).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let out = filter_conferences(&sample(), Some("ai"), Some("Online"), None, None).unwrap();
        assert_eq!(names(&out), vec!["AI Summit"]);
    }

    #[test]
    fn test_no_predicates_sorts_everything_by_start() {
        let out = ConferenceFilter::new().apply(&sample()).unwrap();
        assert_eq!(
            names(&out),
            vec!["PyCon", "JSConf", "AI Summit", "Data Days", "ML Live"]
        );
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let items = sample();
        let after = ConferenceFilter::new().after("2025-04-02").apply(&items).unwrap();
        assert_eq!(names(&after), vec!["Data Days", "ML Live"]);

        let before = ConferenceFilter::new().before("2025-02-01").apply(&items).unwrap();
        assert_eq!(names(&before), vec!["PyCon", "JSConf"]);
    }

    #[test]
    fn test_dates_compare_as_dates_not_strings() {
        let items = vec![conference("Late", "2025-10-01", "2025-10-02", "Y", &[])];
        let out = ConferenceFilter::new().after("2025-09-30").apply(&items).unwrap();
        assert_eq!(out.len(), 1);
        let out = ConferenceFilter::new().after("2025-10-03").apply(&items).unwrap();
        assert!(out.is_empty());
        let out = ConferenceFilter::new().after("2025-09-30T00:00:00").apply(&items).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_invalid_bound_is_an_error() {
        let err = ConferenceFilter::new().before("next week").apply(&sample()).unwrap_err();
        assert!(matches!(err, ConfradarError::InvalidDate { .. }));
    }

    #[test]
    fn test_sort_is_stable_for_same_start() {
        let items = vec![
            conference("Second", "2025-01-01", "2025-01-02", "Y", &[]),
            conference("First", "2025-01-01", "2025-01-01", "Y", &[]),
        ];
        let out = ConferenceFilter::new().apply(&items).unwrap();
        assert_eq!(names(&out), vec!["Second", "First"]);
    }

    #[test]
    fn test_undated_records_sort_last_and_fail_bounds() {
        let items = vec![
            conference("Undated", "soon", "soon", "Y", &[]),
            conference("Dated", "2025-01-01", "2025-01-01", "Y", &[]),
        ];
        let all = ConferenceFilter::new().apply(&items).unwrap();
        assert_eq!(names(&all), vec!["Dated", "Undated"]);

        let bounded = ConferenceFilter::new().after("2000-01-01").apply(&items).unwrap();
        assert_eq!(names(&bounded), vec!["Dated"]);
    }
}
