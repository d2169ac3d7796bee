use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};

#[derive(Clone, Debug, Eq, Default)]
pub struct Labels(Arc<Map>);

pub type Map = BTreeMap<String, String>;

pub type Expressions = Vec<Expression>;

/// A set-based selector requirement.
///
/// Expressions are accepted so that documents carrying them still parse, but
/// they are never evaluated.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Expression {
    pub key: String,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

/// Selects a set of workloads (or namespaces) by their labels.
#[derive(Clone, Debug, Eq, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    match_labels: Option<Map>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    match_expressions: Option<Expressions>,
}

// === Selector ===

impl Selector {
    pub fn from_map(map: Map) -> Self {
        Self {
            match_labels: Some(map),
            match_expressions: None,
        }
    }

    /// Every `matchLabels` entry must be present in `labels` with an identical
    /// value. An empty selector matches everything.
    pub fn matches(&self, labels: &Labels) -> bool {
        if let Some(match_labels) = self.match_labels.as_ref() {
            for (k, v) in match_labels.iter() {
                if labels.0.get(k) != Some(v) {
                    return false;
                }
            }
        }

        true
    }

    pub fn has_expressions(&self) -> bool {
        self.match_expressions
            .as_ref()
            .map_or(false, |exprs| !exprs.is_empty())
    }
}

impl std::iter::FromIterator<(String, String)> for Selector {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self::from_map(iter.into_iter().collect())
    }
}

impl std::iter::FromIterator<(&'static str, &'static str)> for Selector {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        Self::from_map(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl std::iter::FromIterator<Expression> for Selector {
    fn from_iter<T: IntoIterator<Item = Expression>>(iter: T) -> Self {
        Self {
            match_labels: None,
            match_expressions: Some(iter.into_iter().collect()),
        }
    }
}

// === Labels ===

impl Labels {
    /// The synthetic label set of a namespace.
    ///
    /// Namespace selectors are evaluated only against the namespace's name.
    pub fn namespace(name: impl ToString) -> Self {
        Some(("name".to_string(), name.to_string()))
            .into_iter()
            .collect()
    }
}

impl From<Map> for Labels {
    #[inline]
    fn from(labels: Map) -> Self {
        Self(Arc::new(labels))
    }
}

impl From<Option<Map>> for Labels {
    #[inline]
    fn from(labels: Option<Map>) -> Self {
        labels.unwrap_or_default().into()
    }
}

impl AsRef<Map> for Labels {
    #[inline]
    fn as_ref(&self) -> &Map {
        self.0.as_ref()
    }
}

impl<T: AsRef<Map>> std::cmp::PartialEq<T> for Labels {
    #[inline]
    fn eq(&self, t: &T) -> bool {
        self.0.as_ref().eq(t.as_ref())
    }
}

impl std::iter::FromIterator<(String, String)> for Labels {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(Arc::new(iter.into_iter().collect()))
    }
}

impl std::iter::FromIterator<(&'static str, &'static str)> for Labels {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

impl Serialize for Labels {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::iter::FromIterator;

    #[test]
    fn test_matches() {
        for (selector, labels, matches, msg) in &[
            (Selector::default(), Labels::default(), true, "empty match"),
            (
                Selector::default(),
                Labels::from_iter(Some(("app", "web"))),
                true,
                "empty selector matches any labels",
            ),
            (
                Selector::from_map(Map::new()),
                Labels::from_iter(Some(("app", "web"))),
                true,
                "empty match map",
            ),
            (
                Selector::from_iter(Some(("foo", "bar"))),
                Labels::from_iter(Some(("foo", "bar"))),
                true,
                "exact label match",
            ),
            (
                Selector::from_iter(Some(("foo", "bar"))),
                Labels::from_iter(vec![("foo", "bar"), ("bah", "baz")]),
                true,
                "sufficient label match",
            ),
            (
                Selector::from_iter(Some(("foo", "bar"))),
                Labels::from_iter(Some(("foo", "baz"))),
                false,
                "value mismatch",
            ),
            (
                Selector::from_iter(vec![("foo", "bar"), ("bah", "baz")]),
                Labels::from_iter(Some(("foo", "bar"))),
                false,
                "missing key",
            ),
            (
                Selector::from_iter(Some(("foo", "bar"))),
                Labels::default(),
                false,
                "no labels",
            ),
        ] {
            assert_eq!(selector.matches(labels), *matches, "{}", msg);
        }
    }

    #[test]
    fn expressions_are_not_evaluated() {
        let selector = Selector::from_iter(Some(Expression {
            key: "app".into(),
            operator: "NotIn".into(),
            values: Some(vec!["web".to_string()]),
        }));
        assert!(selector.has_expressions());
        assert!(selector.matches(&Labels::from_iter(Some(("app", "web")))));
        assert!(!Selector::default().has_expressions());
    }

    #[test]
    fn namespace_labels() {
        let selector = Selector::from_iter(Some(("name", "frontend")));
        assert!(selector.matches(&Labels::namespace("frontend")));
        assert!(!selector.matches(&Labels::namespace("backend")));
    }

    #[test]
    fn deserializes_match_labels() {
        let selector = serde_json::from_value::<Selector>(serde_json::json!({
            "matchLabels": { "app": "web" },
            "matchExpressions": [{ "key": "tier", "operator": "Exists" }],
        }))
        .unwrap();
        assert!(selector.has_expressions());
        // Only the labels constrain matching.
        let web = maplit::btreemap! { "app".to_string() => "web".to_string() };
        assert!(selector.matches(&Labels::from(web)));
        assert!(!selector.matches(&Labels::default()));
    }
}
