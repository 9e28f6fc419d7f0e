// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! PostgREST query builder.
//!
//! ```rust,ignore
//! let q = Query::table("aid_requests")
//!     .select("*")
//!     .embed("requester:users!creator_id", "id,name")
//!     .eq("status", "active")
//!     .order("created_at", true)
//!     .limit(20);
//! // select=*,requester:users!creator_id(id,name)&status=eq.active&order=created_at.desc&limit=20
//! ```

use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: String,
    columns: Vec<String>,
    filters: Vec<(String, String)>,
    order: Vec<String>,
    limit: Option<usize>,
}

impl Query {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Columns to return (`*` when never called).
    pub fn select(mut self, columns: &str) -> Self {
        self.columns.push(columns.to_string());
        self
    }

    /// Embed a related table through a foreign key, e.g.
    /// `embed("requester:users!creator_id", "id,name")`.
    pub fn embed(mut self, relation: &str, columns: &str) -> Self {
        self.columns.push(format!("{relation}({columns})"));
        self
    }

    fn filter(mut self, column: &str, op: &str, value: impl Display) -> Self {
        self.filters.push((column.to_string(), format!("{op}.{value}")));
        self
    }

    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "eq", value)
    }

    pub fn neq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "neq", value)
    }

    pub fn gt(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "gt", value)
    }

    pub fn gte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "gte", value)
    }

    pub fn lt(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "lt", value)
    }

    pub fn lte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "lte", value)
    }

    /// Case-insensitive pattern match; `*` is the wildcard.
    pub fn ilike(self, column: &str, pattern: &str) -> Self {
        self.filter(column, "ilike", pattern)
    }

    pub fn is_null(self, column: &str) -> Self {
        self.filter(column, "is", "null")
    }

    pub fn in_list<V: Display>(self, column: &str, values: &[V]) -> Self {
        let list = values
            .iter()
            .map(|v| quote_list_item(&v.to_string()))
            .collect::<Vec<_>>()
            .join(",");
        self.filter(column, "in", format!("({list})"))
    }

    pub fn order(mut self, column: &str, descending: bool) -> Self {
        let direction = if descending { "desc" } else { "asc" };
        self.order.push(format!("{column}.{direction}"));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query-string parameters for a read.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let select = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        };
        let mut params = vec![("select".to_string(), select)];
        params.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            params.push(("order".to_string(), self.order.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// Only the row filters (for `PATCH` and `DELETE`).
    pub fn filter_params(&self) -> &[(String, String)] {
        &self.filters
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }
}

/// Values containing list separators must be double-quoted inside `in.(..)`.
fn quote_list_item(value: &str) -> String {
    if value.contains([',', '(', ')', '"']) || value.contains(' ') {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}
