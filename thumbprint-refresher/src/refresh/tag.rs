use serde::Serialize;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// A `key[=value]` selector. A tag without a value matches any value of its key.
pub struct Tag {
    pub key: String,
    pub value: Option<String>,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Parses `key=value` or a bare `key`, splitting on the first `=` only.
    pub fn parse(s: &str) -> Self {
        match s.split_once('=') {
            Some((key, value)) => Self::new(key, Some(value.to_string())),
            None => Self::new(s, None),
        }
    }
}

impl FromStr for Tag {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.as_deref() {
            Some(value) if !value.is_empty() => write!(f, "{}={}", self.key, value),
            _ => f.write_str(&self.key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One key of a tag query: the resource must carry `key` with one of `values`
/// (any value when `values` is empty).
pub struct TagQuery {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Values")]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Tags grouped by key, in first-seen order, values de-duplicated per key.
pub struct TagFilter {
    entries: Vec<(String, Vec<String>)>,
}

impl TagFilter {
    pub fn build<I>(tags: I) -> Self
    where
        I: IntoIterator<Item = Tag>,
    {
        let mut entries: Vec<(String, Vec<String>)> = Vec::new();
        for tag in tags {
            let idx = match entries.iter().position(|(key, _)| *key == tag.key) {
                Some(idx) => idx,
                None => {
                    entries.push((tag.key, Vec::new()));
                    entries.len() - 1
                }
            };
            if let Some(value) = tag.value.filter(|v| !v.is_empty()) {
                let values = &mut entries[idx].1;
                if !values.contains(&value) {
                    values.push(value);
                }
            }
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The filter in the shape the tag query API expects.
    pub fn to_query(&self) -> Vec<TagQuery> {
        self.entries
            .iter()
            .map(|(key, values)| TagQuery {
                key: key.clone(),
                values: values.clone(),
            })
            .collect()
    }

    /// Local evaluation of the filter against a resource's tags.
    ///
    /// Every recorded `(key, value)` pair must be present on the candidate; a
    /// key recorded without values only requires the key itself.
    pub fn matches(&self, candidate: &[Tag]) -> bool {
        self.entries.iter().all(|(key, values)| {
            if values.is_empty() {
                candidate.iter().any(|tag| tag.key == *key)
            } else {
                values.iter().all(|value| {
                    candidate
                        .iter()
                        .any(|tag| tag.key == *key && tag.value.as_deref() == Some(value.as_str()))
                })
            }
        })
    }
}

impl FromIterator<Tag> for TagFilter {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self::build(iter)
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, (key, values)) in self.entries.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}:[{}]", values.join(","))?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(key: &str, value: &str) -> Tag {
        Tag::new(key, Some(value.to_string()))
    }

    #[test]
    fn parse_splits_on_first_equals_only() {
        assert_eq!(Tag::parse("Name=Value"), tag("Name", "Value"));
        assert_eq!(Tag::parse("Name=ab=c").value.as_deref(), Some("ab=c"));
        assert_eq!(Tag::parse("Name").value, None);
        assert_eq!(Tag::parse("=x").key, "");
    }

    #[test]
    fn display_omits_missing_value() {
        assert_eq!(Tag::parse("Name").to_string(), "Name");
        assert_eq!(Tag::parse("Name=Value").to_string(), "Name=Value");
    }

    #[test]
    fn bare_key_exports_empty_values() {
        let filter = TagFilter::build([Tag::parse("Name")]);
        assert_eq!(
            filter.to_query(),
            vec![TagQuery {
                key: "Name".into(),
                values: vec![]
            }]
        );
    }

    #[test]
    fn groups_and_dedups_in_first_seen_order() {
        let filter: TagFilter = [
            tag("Name", "Value"),
            tag("Name", "Value2"),
            tag("Region", "eu-west-1a"),
            tag("Name", "Value"),
            tag("Region", "eu-west-1b"),
        ]
        .into_iter()
        .collect();

        let query = filter.to_query();
        assert_eq!(query.len(), 2);
        assert_eq!(query[0].key, "Name");
        assert_eq!(query[0].values, vec!["Value", "Value2"]);
        assert_eq!(query[1].key, "Region");
        assert_eq!(query[1].values, vec!["eu-west-1a", "eu-west-1b"]);
    }

    #[test]
    fn query_serializes_in_api_shape() {
        let filter = TagFilter::build([tag("auto-refresh", "true")]);
        let json = serde_json::to_value(filter.to_query()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "Key": "auto-refresh", "Values": ["true"] }])
        );
    }

    #[test]
    fn bare_key_matches_any_value() {
        let filter = TagFilter::build([Tag::parse("Name")]);
        assert!(filter.matches(&[tag("Name", "anything")]));
        assert!(filter.matches(&[Tag::parse("Name")]));
        assert!(!filter.matches(&[tag("Other", "x")]));
    }

    #[test]
    fn every_recorded_pair_must_be_present() {
        let filter = TagFilter::build([tag("auto-refresh", "true"), tag("team", "iam")]);
        assert!(filter.matches(&[tag("team", "iam"), tag("auto-refresh", "true")]));
        assert!(!filter.matches(&[tag("auto-refresh", "true")]));
        assert!(!filter.matches(&[tag("auto-refresh", "false"), tag("team", "iam")]));
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = TagFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&[]));
        assert!(filter.matches(&[tag("a", "b")]));
    }

    #[test]
    fn display_renders_groups() {
        let filter = TagFilter::build([tag("a", "1"), tag("a", "2"), Tag::parse("b")]);
        assert_eq!(filter.to_string(), "[a:[1,2], b:[]]");
    }
}
