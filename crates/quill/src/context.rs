//! Query context: ordering, grouping, limit, skip and the transaction token.
//!
//! A [`QueryContext`] never changes in place. Every `with_*` method returns a
//! new context that differs from the receiver in exactly one field; the
//! transaction token is copied along unless a
//! [`Transaction`](crate::transaction::Transaction) rebinds it.
//!
//! ```
//! use quill::QueryContext;
//!
//! let base = QueryContext::default();
//! let page = base.with_order("created_at DESC").with_limit(10).with_skip(20);
//!
//! assert_eq!(base.limit(), 0);
//! assert_eq!(page.clauses(), "ORDER BY created_at DESC LIMIT 10 OFFSET 20");
//! ```

use crate::core::TxToken;

/// Immutable bundle of query modifiers and an optional transaction token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryContext {
    order: String,
    group: String,
    limit: usize,
    skip: usize,
    tx: TxToken,
}

impl QueryContext {
    /// Creates an empty context with no transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with the ordering replaced.
    pub fn with_order(&self, order: impl Into<String>) -> Self {
        Self {
            order: order.into(),
            ..self.clone()
        }
    }

    /// Returns a copy with the grouping replaced.
    pub fn with_group(&self, group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            ..self.clone()
        }
    }

    /// Returns a copy with the limit replaced. Zero means no limit.
    pub fn with_limit(&self, limit: usize) -> Self {
        Self {
            limit,
            ..self.clone()
        }
    }

    /// Returns a copy with the skip count replaced.
    pub fn with_skip(&self, skip: usize) -> Self {
        Self {
            skip,
            ..self.clone()
        }
    }

    pub(crate) fn with_tx(&self, tx: TxToken) -> Self {
        Self {
            tx,
            ..self.clone()
        }
    }

    /// Returns the ordering expression.
    pub fn order(&self) -> &str {
        &self.order
    }

    /// Returns the grouping expression.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns the row limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the number of rows to skip.
    pub fn skip(&self) -> usize {
        self.skip
    }

    /// Returns the attached transaction token.
    pub fn tx(&self) -> &TxToken {
        &self.tx
    }

    /// Formats the query suffix a SQL backend appends to its statement.
    ///
    /// Clauses appear as group, order, limit, skip. Empty strings and zero
    /// counts are left out, so the default context yields an empty string.
    pub fn clauses(&self) -> String {
        let mut parts = Vec::with_capacity(4);
        if !self.group.is_empty() {
            parts.push(format!("GROUP BY {}", self.group));
        }
        if !self.order.is_empty() {
            parts.push(format!("ORDER BY {}", self.order));
        }
        if self.limit > 0 {
            parts.push(format!("LIMIT {}", self.limit));
        }
        if self.skip > 0 {
            parts.push(format!("OFFSET {}", self.skip));
        }
        parts.join(" ")
    }
}
