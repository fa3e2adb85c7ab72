//! Store-agnostic query description.

use serde_json::Value;

use crate::period::DateRange;

/// A column or embedded relation to return.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// A plain column, or `*` for every column.
    Column(String),
    /// A related row joined through `foreign_key` and returned under `alias`.
    Embed {
        /// Key under which the related row appears.
        alias: String,
        /// Related table.
        table: String,
        /// Column on the queried table holding the related row's `id`.
        foreign_key: String,
        /// Columns of the related row to return.
        columns: Vec<String>,
    },
}

/// Predicate operator with its operand.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Equal.
    Eq(Value),
    /// Not equal.
    Neq(Value),
    /// Greater than.
    Gt(Value),
    /// Greater than or equal.
    Gte(Value),
    /// Less than.
    Lt(Value),
    /// Less than or equal.
    Lte(Value),
    /// Member of a set.
    In(Vec<Value>),
    /// Column is null (or absent).
    IsNull,
    /// Column is not null.
    NotNull,
}

/// A predicate on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Column the predicate applies to.
    pub column: String,
    /// Operator and operand.
    pub op: FilterOp,
}

/// Sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Column to sort on.
    pub column: String,
    /// Ascending when true.
    pub ascending: bool,
}

/// A read query against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Table name.
    pub table: String,
    /// Projection; empty means every column.
    pub columns: Vec<Projection>,
    /// Conjunction of predicates.
    pub filters: Vec<Filter>,
    /// Sort keys, most significant first.
    pub order: Vec<OrderBy>,
    /// Maximum number of rows.
    pub limit: Option<u32>,
}

impl Query {
    /// Starts a query on `table`.
    #[must_use]
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Adds plain columns to the projection.
    #[must_use]
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns
            .extend(columns.into_iter().map(|c| Projection::Column(c.into())));
        self
    }

    /// Embeds the row of `table` whose `id` equals this row's `foreign_key`.
    #[must_use]
    pub fn embed<I, S>(
        mut self,
        alias: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
        columns: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.push(Projection::Embed {
            alias: alias.into(),
            table: table.into(),
            foreign_key: foreign_key.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    fn filter(mut self, column: impl Into<String>, op: FilterOp) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            op,
        });
        self
    }

    /// `column = value`
    #[must_use]
    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Eq(value.into()))
    }

    /// `column <> value`
    #[must_use]
    pub fn neq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Neq(value.into()))
    }

    /// `column > value`
    #[must_use]
    pub fn gt(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Gt(value.into()))
    }

    /// `column >= value`
    #[must_use]
    pub fn gte(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Gte(value.into()))
    }

    /// `column < value`
    #[must_use]
    pub fn lt(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Lt(value.into()))
    }

    /// `column <= value`
    #[must_use]
    pub fn lte(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Lte(value.into()))
    }

    /// `column IN (values)`
    #[must_use]
    pub fn is_in<I, V>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filter(
            column,
            FilterOp::In(values.into_iter().map(Into::into).collect()),
        )
    }

    /// `column IS NULL`
    #[must_use]
    pub fn is_null(self, column: impl Into<String>) -> Self {
        self.filter(column, FilterOp::IsNull)
    }

    /// `column IS NOT NULL`
    #[must_use]
    pub fn not_null(self, column: impl Into<String>) -> Self {
        self.filter(column, FilterOp::NotNull)
    }

    /// Restricts a timestamp column to the half-open range.
    #[must_use]
    pub fn within(self, column: &str, range: &DateRange) -> Self {
        self.gte(column, range.start_rfc3339())
            .lt(column, range.end_rfc3339())
    }

    /// Restricts a timestamp column to instants before the range starts.
    #[must_use]
    pub fn before(self, column: &str, range: &DateRange) -> Self {
        self.lt(column, range.start_rfc3339())
    }

    /// Applies `column = value` only when a value is given.
    #[must_use]
    pub fn eq_opt(self, column: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.eq(column, value),
            None => self,
        }
    }

    /// Sorts ascending on `column`.
    #[must_use]
    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.order.push(OrderBy {
            column: column.into(),
            ascending: true,
        });
        self
    }

    /// Sorts descending on `column`.
    #[must_use]
    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order.push(OrderBy {
            column: column.into(),
            ascending: false,
        });
        self
    }

    /// Caps the number of rows returned.
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}
