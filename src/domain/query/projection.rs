//! Projection type algebra.
//!
//! A projection is a type that knows which columns it asks for and how the
//! answer deserializes:
//!
//! - the row type itself is the wildcard: every field present
//! - a [`pick!`](crate::pick) struct names required columns and keeps the
//!   rest of the row in an all-optional patch
//! - collections are always `Vec<P>`, an empty answer is an empty `Vec`
//!
//! Select items are built from `R::Column` values, so a projection cannot
//! name a column the table does not have.

use serde::de::DeserializeOwned;

use crate::domain::schema::{Column, Row};

/// Aggregate functions usable in a select list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Avg,
    Count,
    Sum,
    Min,
    Max,
}

impl Aggregate {
    fn as_str(&self) -> &'static str {
        match self {
            Aggregate::Avg => "avg",
            Aggregate::Count => "count",
            Aggregate::Sum => "sum",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
        }
    }
}

/// One entry of an explicit select list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectItem<C> {
    Column(C),
    /// `alias:column`
    Aliased { alias: &'static str, column: C },
    /// `alias:column.function()`
    Aggregate {
        alias: &'static str,
        column: C,
        function: Aggregate,
    },
}

impl<C: Column> SelectItem<C> {
    fn render(&self) -> String {
        match self {
            SelectItem::Column(column) => column.name().to_string(),
            SelectItem::Aliased { alias, column } => format!("{}:{}", alias, column.name()),
            SelectItem::Aggregate {
                alias,
                column,
                function,
            } => format!("{}:{}.{}()", alias, column.name(), function.as_str()),
        }
    }
}

/// Columns requested from one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectList<C> {
    Wildcard,
    Items(Vec<SelectItem<C>>),
}

impl<C: Column> SelectList<C> {
    /// Plain column list.
    pub fn columns<I>(columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
    {
        SelectList::Items(columns.into_iter().map(SelectItem::Column).collect())
    }

    pub fn items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = SelectItem<C>>,
    {
        SelectList::Items(items.into_iter().collect())
    }

    /// Value of the `select` query parameter.
    pub fn render(&self) -> String {
        match self {
            SelectList::Wildcard => "*".to_string(),
            SelectList::Items(items) if items.is_empty() => "*".to_string(),
            SelectList::Items(items) => items
                .iter()
                .map(SelectItem::render)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// Shape returned by a query over `R`.
pub trait Projection<R: Row>: DeserializeOwned + Send + 'static {
    fn select_list() -> SelectList<R::Column>;

    fn select() -> String {
        Self::select_list().render()
    }
}
