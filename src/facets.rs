//! Facet aggregation: grouping entries by metadata fields and counting values.

use serde::Serialize;
use std::collections::HashMap;

use crate::types::{Entry, FacetDefinition, FacetField};

/// Occurrence counts for one facet definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetCount {
    pub label: String,
    pub field: FacetField,
    /// Observed value (or year, for [`FacetField::Date`]) → number of entries.
    pub counts: HashMap<String, usize>,
}

impl FacetCount {
    /// Values sorted by count descending, ties broken by value ascending.
    pub fn sorted_values(&self) -> Vec<(&str, usize)> {
        let mut values: Vec<(&str, usize)> = self
            .counts
            .iter()
            .map(|(value, count)| (value.as_str(), *count))
            .collect();
        values.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        values
    }
}

/// Counts for every configured facet, in definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FacetCounts(pub Vec<FacetCount>);

impl FacetCounts {
    /// Looks a facet up by field name (`"creators"`) or by label (`"Authors"`).
    pub fn get(&self, key: &str) -> Option<&HashMap<String, usize>> {
        self.0
            .iter()
            .find(|f| f.field.as_str() == key)
            .or_else(|| self.0.iter().find(|f| f.label == key))
            .map(|f| &f.counts)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FacetCount> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Extracts the bucket key of a date value: its first four characters, if all are digits.
///
/// `"April 2020"` yields `None`, not `"2020"`; only the leading characters are considered.
pub fn year_bucket(date: &str) -> Option<&str> {
    let end = date.char_indices().nth(4).map_or(date.len(), |(i, _)| i);
    let prefix = &date[..end];
    (prefix.len() == 4 && prefix.bytes().all(|b| b.is_ascii_digit())).then_some(prefix)
}

/// The bucket keys `entry` contributes to for `field`.
pub fn facet_keys<'e>(entry: &'e Entry, field: FacetField) -> Vec<&'e str> {
    let values = field.values(entry);
    match field {
        FacetField::Date => values.into_iter().filter_map(year_bucket).collect(),
        _ => values,
    }
}

/// Groups `entries` by every facet in `definitions` and counts each value.
///
/// # Arguments
///
/// * `entries` - The full entry collection (entries without an id included)
/// * `definitions` - Facets to compute; their order is kept in the result
///
/// # Returns
///
/// * `FacetCounts` - One [`FacetCount`] per definition
pub fn build_facets(entries: &[Entry], definitions: &[FacetDefinition]) -> FacetCounts {
    FacetCounts(
        definitions
            .iter()
            .map(|definition| {
                let mut counts: HashMap<String, usize> = HashMap::new();
                for entry in entries {
                    for key in facet_keys(entry, definition.field) {
                        *counts.entry(key.to_string()).or_insert(0) += 1;
                    }
                }
                FacetCount {
                    label: definition.label.clone(),
                    field: definition.field,
                    counts,
                }
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, creators: &[&str], subjects: &[&str]) -> Entry {
        Entry {
            creators: creators.iter().map(|s| s.to_string()).collect(),
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
            ..Entry::new(id, id)
        }
    }

    #[test]
    fn test_build_facets_counts_list_fields() {
        let entries = vec![
            entry("a1", &["Jane Doe"], &["Math"]),
            entry("b2", &["Jane Doe", "John Roe"], &["Math", "CS"]),
        ];
        let facets = build_facets(&entries, &FacetDefinition::defaults());

        assert_eq!(facets.len(), 4);
        assert_eq!(facets.get("creators").unwrap()["Jane Doe"], 2);
        assert_eq!(facets.get("Authors").unwrap()["John Roe"], 1);
        assert_eq!(facets.get("subjects").unwrap()["Math"], 2);
        assert_eq!(facets.get("subjects").unwrap()["CS"], 1);
        assert!(facets.get("publisher").unwrap().is_empty());
    }

    #[test]
    fn test_year_buckets_skip_malformed_dates() {
        let mut entries = Vec::new();
        for (id, date) in [("a", "2020-01-01"), ("b", "99"), ("c", "20xx"), ("d", "April 2020")] {
            let mut e = Entry::new(id, id);
            e.date = date.to_string();
            entries.push(e);
        }
        let facets = build_facets(&entries, &[FacetDefinition::new("Years", FacetField::Date)]);
        let years = facets.get("date").unwrap();

        assert_eq!(years.len(), 1);
        assert_eq!(years["2020"], 1);
    }

    #[test]
    fn test_year_bucket_handles_multibyte_prefixes() {
        assert_eq!(year_bucket("1999"), Some("1999"));
        assert_eq!(year_bucket("２０２０年"), None);
        assert_eq!(year_bucket(""), None);
    }

    #[test]
    fn test_sorted_values_orders_by_count_then_value() {
        let entries = vec![
            entry("a", &[], &["b", "a"]),
            entry("b", &[], &["c"]),
            entry("c", &[], &["c"]),
        ];
        let facets = build_facets(&entries, &[FacetDefinition::new("S", FacetField::Subjects)]);
        let sorted = facets.iter().next().unwrap().sorted_values();
        assert_eq!(sorted, vec![("c", 2), ("a", 1), ("b", 1)]);
    }
}
