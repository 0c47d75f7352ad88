//! Row predicates and ordering in Postgrest syntax.
//!
//! Predicates are built from typed columns and rendered to query pairs:
//! `col=op.value` at the top level, `col.op.value` inside `or(...)` and
//! `and(...)` groups.

use std::fmt;

use crate::domain::foundation::{
    CartId, CategoryId, ChatId, InteractionId, MessageId, ProductId, ProfileId, ReportId,
    ReviewId, UserId,
};
use crate::domain::schema::Column;

/// Scalar operand of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl FilterValue {
    // Characters Postgrest treats as syntax inside lists and logic groups.
    fn needs_quotes(&self) -> bool {
        match self {
            FilterValue::Text(text) => {
                text.is_empty()
                    || text
                        .chars()
                        .any(|c| matches!(c, ',' | '.' | ':' | '(' | ')' | '"' | '\\') || c.is_whitespace())
            }
            _ => false,
        }
    }

    /// Rendering used inside `in.(...)`, `or(...)` and `and(...)`.
    fn render_nested(&self) -> String {
        if self.needs_quotes() {
            let escaped = self.to_string().replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{}\"", escaped)
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(text) => write!(f, "{}", text),
            FilterValue::Int(value) => write!(f, "{}", value),
            FilterValue::Float(value) => write!(f, "{}", value),
            FilterValue::Bool(value) => write!(f, "{}", value),
            FilterValue::Null => write!(f, "null"),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Int(i64::from(value))
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Float(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<UserId> for FilterValue {
    fn from(value: UserId) -> Self {
        FilterValue::Text(value.to_string())
    }
}

macro_rules! integer_id_values {
    ($($id:ty),+) => {
        $(
            impl From<$id> for FilterValue {
                fn from(value: $id) -> Self {
                    FilterValue::Int(value.value())
                }
            }
        )+
    };
}

integer_id_values!(
    ProfileId,
    ProductId,
    ChatId,
    MessageId,
    CategoryId,
    CartId,
    ReviewId,
    ReportId,
    InteractionId
);

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Gte,
    Lte,
    ILike,
    Is,
}

impl Operator {
    fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Gte => "gte",
            Operator::Lte => "lte",
            Operator::ILike => "ilike",
            Operator::Is => "is",
        }
    }
}

/// A row predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Compare {
        column: &'static str,
        op: Operator,
        value: FilterValue,
    },
    In {
        column: &'static str,
        values: Vec<FilterValue>,
    },
    Or(Vec<Filter>),
    And(Vec<Filter>),
}

impl Filter {
    fn compare<C: Column>(column: C, op: Operator, value: FilterValue) -> Self {
        Filter::Compare {
            column: column.name(),
            op,
            value,
        }
    }

    pub fn eq<C: Column>(column: C, value: impl Into<FilterValue>) -> Self {
        Self::compare(column, Operator::Eq, value.into())
    }

    pub fn gte<C: Column>(column: C, value: impl Into<FilterValue>) -> Self {
        Self::compare(column, Operator::Gte, value.into())
    }

    pub fn lte<C: Column>(column: C, value: impl Into<FilterValue>) -> Self {
        Self::compare(column, Operator::Lte, value.into())
    }

    /// Case-insensitive pattern match; `%` and `_` in `pattern` are wildcards.
    pub fn ilike<C: Column>(column: C, pattern: impl Into<String>) -> Self {
        Self::compare(column, Operator::ILike, FilterValue::Text(pattern.into()))
    }

    pub fn is_null<C: Column>(column: C) -> Self {
        Self::compare(column, Operator::Is, FilterValue::Null)
    }

    pub fn is_in<C, I, V>(column: C, values: I) -> Self
    where
        C: Column,
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        Filter::In {
            column: column.name(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    /// Renders as one `(key, value)` query pair.
    pub fn to_query_pair(&self) -> (String, String) {
        match self {
            Filter::Compare { column, op, value } => {
                (column.to_string(), format!("{}.{}", op.as_str(), value))
            }
            Filter::In { column, values } => (column.to_string(), format!("in.{}", render_list(values))),
            Filter::Or(filters) => ("or".to_string(), render_group(filters)),
            Filter::And(filters) => ("and".to_string(), render_group(filters)),
        }
    }

    fn render_nested(&self) -> String {
        match self {
            Filter::Compare { column, op, value } => {
                format!("{}.{}.{}", column, op.as_str(), value.render_nested())
            }
            Filter::In { column, values } => format!("{}.in.{}", column, render_list(values)),
            Filter::Or(filters) => format!("or{}", render_group(filters)),
            Filter::And(filters) => format!("and{}", render_group(filters)),
        }
    }
}

fn render_list(values: &[FilterValue]) -> String {
    let items: Vec<String> = values.iter().map(FilterValue::render_nested).collect();
    format!("({})", items.join(","))
}

fn render_group(filters: &[Filter]) -> String {
    let items: Vec<String> = filters.iter().map(Filter::render_nested).collect();
    format!("({})", items.join(","))
}

/// Escapes `%`, `_` and `\` so user text matches literally inside an ilike pattern.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub ascending: bool,
}

impl Order {
    pub fn asc<C: Column>(column: C) -> Self {
        Self {
            column: column.name(),
            ascending: true,
        }
    }

    pub fn desc<C: Column>(column: C) -> Self {
        Self {
            column: column.name(),
            ascending: false,
        }
    }

    pub fn render(&self) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        format!("{}.{}", self.column, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{InteractionColumn, ProductColumn};

    #[test]
    fn comparison_renders_as_column_pair() {
        let filter = Filter::gte(ProductColumn::Price, 10.0);
        assert_eq!(filter.to_query_pair(), ("price".into(), "gte.10".into()));
    }

    #[test]
    fn fractional_price_keeps_decimals() {
        let filter = Filter::lte(ProductColumn::Price, 12.5);
        assert_eq!(filter.to_query_pair().1, "lte.12.5");
    }

    #[test]
    fn in_list_renders_parenthesized() {
        let filter = Filter::is_in(ProductColumn::Id, [ProductId::new(5), ProductId::new(6)]);
        assert_eq!(filter.to_query_pair(), ("id".into(), "in.(5,6)".into()));
    }

    #[test]
    fn in_list_quotes_reserved_characters() {
        let filter = Filter::is_in(ProductColumn::Title, ["a,b", "plain"]);
        assert_eq!(filter.to_query_pair().1, "in.(\"a,b\",plain)");
    }

    #[test]
    fn or_of_and_groups_renders_nested() {
        let a = UserId::new("00000000-0000-0000-0000-00000000000a").unwrap();
        let b = UserId::new("00000000-0000-0000-0000-00000000000b").unwrap();
        let filter = Filter::or([
            Filter::and([
                Filter::eq(InteractionColumn::UserId1, a),
                Filter::eq(InteractionColumn::UserId2, b),
            ]),
            Filter::and([
                Filter::eq(InteractionColumn::UserId1, b),
                Filter::eq(InteractionColumn::UserId2, a),
            ]),
        ]);
        let (key, value) = filter.to_query_pair();
        assert_eq!(key, "or");
        assert_eq!(
            value,
            format!(
                "(and(user_id_1.eq.{a},user_id_2.eq.{b}),and(user_id_1.eq.{b},user_id_2.eq.{a}))"
            )
        );
    }

    #[test]
    fn ilike_inside_or_quotes_patterns_with_dots() {
        let filter = Filter::or([
            Filter::ilike(ProductColumn::Title, "%v1.2%"),
            Filter::ilike(ProductColumn::Description, "%lamp%"),
        ]);
        assert_eq!(
            filter.to_query_pair().1,
            "(title.ilike.\"%v1.2%\",description.ilike.%lamp%)"
        );
    }

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn is_null_renders_keyword() {
        let filter = Filter::is_null(ProductColumn::Image);
        assert_eq!(filter.to_query_pair().1, "is.null");
    }

    #[test]
    fn order_renders_direction() {
        assert_eq!(Order::asc(ProductColumn::Title).render(), "title.asc");
        assert_eq!(Order::desc(ProductColumn::CreatedAt).render(), "created_at.desc");
    }
}
