use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of a remote table.
pub type Row = Map<String, Value>;

/// Build a row from `(column, value)` pairs.
pub fn row<I, K>(pairs: I) -> Row
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Filtered read against a single table: equality predicates, ordering, limit.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Query {
    pub table: String,
    pub filters: Vec<(String, Value)>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn table(table: impl Into<String>) -> Self {
        Self { table: table.into(), filters: vec![], order: None, limit: None }
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order { column: column.into(), ascending });
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|(col, val)| row.get(col) == Some(val))
    }

    /// Filter, order and truncate `rows` the way the remote store would.
    pub fn run<'a>(&self, rows: impl IntoIterator<Item = &'a Row>) -> Vec<Row> {
        let mut out: Vec<Row> = rows.into_iter().filter(|r| self.matches(r)).cloned().collect();
        if let Some(order) = &self.order {
            out.sort_by(|a, b| {
                let ord = compare_values(a.get(&order.column), b.get(&order.column));
                if order.ascending { ord } else { ord.reverse() }
            });
        }
        if let Some(n) = self.limit {
            out.truncate(n);
        }
        out
    }
}

/// Missing values sort first; numbers numerically; everything else by its JSON text.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bites() -> Vec<Row> {
        vec![
            row([("id", json!("a")), ("author", json!("u1")), ("created_at", json!(3))]),
            row([("id", json!("b")), ("author", json!("u2")), ("created_at", json!(1))]),
            row([("id", json!("c")), ("author", json!("u1")), ("created_at", json!(2))]),
        ]
    }

    #[test]
    fn filters_by_equality() {
        let rows = bites();
        let out = Query::table("quick_bites").eq("author", "u1").run(&rows);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn orders_and_limits() {
        let rows = bites();
        let out = Query::table("quick_bites").order("created_at", false).limit(2).run(&rows);
        let ids: Vec<_> = out.iter().map(|r| r["id"].as_str().unwrap().to_string()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn missing_column_sorts_first() {
        let rows = vec![row([("id", json!("x")), ("n", json!(1))]), row([("id", json!("y"))])];
        let out = Query::table("t").order("n", true).run(&rows);
        assert_eq!(out[0]["id"], json!("y"));
    }
}
