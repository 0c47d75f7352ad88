//! Server-side filters for realtime inserts.
//!
//! A [`RowFilter`] is a conjunction of `column=eq.value` terms joined by `&`.
//! A [`ChangeFilter`] is a set of alternatives; each alternative becomes its
//! own binding on the channel, so a row matching any of them is delivered.

use std::marker::PhantomData;

use crate::domain::query::FilterValue;
use crate::domain::schema::{Column, Row};

/// Equality terms that must all hold.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFilter<R: Row> {
    terms: Vec<(R::Column, FilterValue)>,
    _row: PhantomData<fn() -> R>,
}

impl<R: Row> RowFilter<R> {
    pub fn eq(column: R::Column, value: impl Into<FilterValue>) -> Self {
        Self {
            terms: vec![(column, value.into())],
            _row: PhantomData,
        }
    }

    /// Adds another required term.
    pub fn and(mut self, column: R::Column, value: impl Into<FilterValue>) -> Self {
        self.terms.push((column, value.into()));
        self
    }

    pub fn render(&self) -> String {
        self.terms
            .iter()
            .map(|(column, value)| format!("{}=eq.{}", column.name(), value))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Alternatives of row filters; empty means every insert.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeFilter<R: Row> {
    alternatives: Vec<RowFilter<R>>,
}

impl<R: Row> ChangeFilter<R> {
    /// Every insert into the table.
    pub fn all() -> Self {
        Self {
            alternatives: Vec::new(),
        }
    }

    pub fn any_of(alternatives: impl IntoIterator<Item = RowFilter<R>>) -> Self {
        Self {
            alternatives: alternatives.into_iter().collect(),
        }
    }

    /// One rendered filter per binding; `None` binds without a filter.
    pub fn rendered(&self) -> Vec<Option<String>> {
        if self.alternatives.is_empty() {
            vec![None]
        } else {
            self.alternatives.iter().map(|f| Some(f.render())).collect()
        }
    }
}

impl<R: Row> From<RowFilter<R>> for ChangeFilter<R> {
    fn from(filter: RowFilter<R>) -> Self {
        Self {
            alternatives: vec![filter],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ChatId, UserId};
    use crate::domain::schema::{Chat, ChatColumn, Message, MessageColumn};

    #[test]
    fn single_term_renders_eq() {
        let filter = RowFilter::<Message>::eq(MessageColumn::ChatId, ChatId::new(9));
        assert_eq!(filter.render(), "chat_id=eq.9");
    }

    #[test]
    fn terms_join_with_ampersand() {
        let filter = RowFilter::<Message>::eq(MessageColumn::ChatId, ChatId::new(9))
            .and(MessageColumn::Visible, true);
        assert_eq!(filter.render(), "chat_id=eq.9&visible=eq.true");
    }

    #[test]
    fn alternatives_render_one_binding_each() {
        let user = UserId::random();
        let filter = ChangeFilter::any_of([
            RowFilter::<Chat>::eq(ChatColumn::UserId1, user),
            RowFilter::<Chat>::eq(ChatColumn::UserId2, user),
        ]);
        assert_eq!(
            filter.rendered(),
            vec![
                Some(format!("user_id_1=eq.{}", user)),
                Some(format!("user_id_2=eq.{}", user)),
            ]
        );
    }

    #[test]
    fn empty_filter_binds_unfiltered() {
        assert_eq!(ChangeFilter::<Chat>::all().rendered(), vec![None]);
    }
}
