//! Collection queries: field filters, one ordering, and a limit.
//!
//! Evaluation is shared by every backend that cannot push the query down
//! to its storage engine: [`Query::apply`] filters, sorts (stable) and
//! truncates an iterator of documents.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::document::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Equal { field: String, value: Value },
    GreaterOrEqual { field: String, value: Value },
    LessOrEqual { field: String, value: Value },
}

impl Filter {
    fn matches(&self, fields: &Value) -> bool {
        match self {
            Filter::Equal { field, value } => fields
                .get(field)
                .map(|v| v == value || compare_values(v, value) == Some(Ordering::Equal))
                .unwrap_or(false),
            Filter::GreaterOrEqual { field, value } => fields
                .get(field)
                .and_then(|v| compare_values(v, value))
                .map(|o| o != Ordering::Less)
                .unwrap_or(false),
            Filter::LessOrEqual { field, value } => fields
                .get(field)
                .and_then(|v| compare_values(v, value))
                .map(|o| o != Ordering::Greater)
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Equal {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn where_gte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::GreaterOrEqual {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn where_lte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::LessOrEqual {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// `true` when the document passes every filter. Documents missing the
    /// ordering field never match, as in most document databases.
    pub fn matches(&self, fields: &Value) -> bool {
        if let Some((field, _)) = &self.order_by {
            if fields.get(field).is_none() {
                return false;
            }
        }
        self.filters.iter().all(|f| f.matches(fields))
    }

    /// Filter, order and truncate documents given in storage order.
    pub fn apply<I>(&self, docs: I) -> Vec<Document>
    where
        I: IntoIterator<Item = Document>,
    {
        let mut hits: Vec<Document> = docs
            .into_iter()
            .filter(|d| self.matches(&d.fields))
            .collect();

        if let Some((field, direction)) = &self.order_by {
            hits.sort_by(|a, b| {
                let ord = match (a.fields.get(field), b.fields.get(field)) {
                    (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                    _ => Ordering::Equal,
                };
                match direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }

        if let Some(n) = self.limit {
            hits.truncate(n);
        }
        hits
    }
}

/// Order two JSON values of the same kind. Strings that both parse as
/// RFC 3339 instants compare chronologically; other strings compare
/// lexically (ISO dates sort correctly that way). Mixed kinds do not
/// compare.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return Some(x.cmp(&y));
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return Some(x.cmp(&y));
            }
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        (Value::String(x), Value::String(y)) => match (parse_instant(x), parse_instant(y)) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => Some(x.cmp(y)),
        },
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    // Cheap pre-check so plain dates and names skip the parser.
    if s.len() < 20 || s.as_bytes().get(10) != Some(&b'T') {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, fields: Value) -> Document {
        Document {
            id: id.into(),
            fields,
        }
    }

    fn logs() -> Vec<Document> {
        vec![
            doc("a", json!({"userId": "u1", "date": "2026-10-10", "totalTimeMillis": 10})),
            doc("b", json!({"userId": "u1", "date": "2026-10-17", "totalTimeMillis": 20})),
            doc("c", json!({"userId": "u2", "date": "2026-10-17", "totalTimeMillis": 30})),
            doc("d", json!({"userId": "u1", "date": "2026-10-12", "totalTimeMillis": 40})),
        ]
    }

    #[test]
    fn equality_and_range_with_descending_order() {
        let q = Query::collection("study_logs")
            .where_eq("userId", "u1")
            .where_gte("date", "2026-10-11")
            .order_by("date", Direction::Descending);

        let ids: Vec<_> = q.apply(logs()).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["b", "d"]);
    }

    #[test]
    fn limit_and_numeric_upper_bound() {
        let q = Query::collection("study_logs")
            .where_lte("totalTimeMillis", 30)
            .order_by("totalTimeMillis", Direction::Ascending)
            .limit(2);

        let ids: Vec<_> = q.apply(logs()).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn missing_order_field_excludes_document() {
        let docs = vec![doc("x", json!({"content": "no stamp"})), doc("y", json!({"timestamp": "2026-10-18T10:00:00.000Z"}))];
        let q = Query::collection("m").order_by("timestamp", Direction::Ascending);
        let ids: Vec<_> = q.apply(docs).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["y"]);
    }

    #[test]
    fn instants_compare_chronologically() {
        let a = json!("2026-10-18T10:00:00Z");
        let b = json!("2026-10-18T10:00:00.250Z");
        assert_eq!(compare_values(&a, &b), Some(Ordering::Less));
        assert_eq!(compare_values(&json!(1), &json!("1")), None);
    }

    #[test]
    fn ties_keep_storage_order() {
        let docs = vec![
            doc("first", json!({"timestamp": "2026-10-18T10:00:00.000Z"})),
            doc("second", json!({"timestamp": "2026-10-18T10:00:00.000Z"})),
        ];
        let q = Query::collection("m").order_by("timestamp", Direction::Ascending);
        let ids: Vec<_> = q.apply(docs).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }
}
