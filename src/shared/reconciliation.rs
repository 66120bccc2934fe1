//! Local view over one fetched page.
//!
//! Admin screens fetch a server page and then narrow or reorder it locally
//! (free-text search, show-inactive toggle, click-to-sort columns). This
//! module does that without ever fetching more rows: the result only holds
//! rows from the page it was given, and the server pagination is passed
//! through untouched. A default [`LocalView`] returns the page as-is.

use std::cmp::Ordering;
use std::fmt::Debug;

use chrono::{DateTime, Utc};

use crate::shared::constants::DEFAULT_LOCALE;
use crate::shared::types::{PageEnvelope, Pagination, SortDirection};

/// Value a row exposes for one sortable column
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    /// Compared case-insensitively
    Text(String),
    Number(f64),
    Time(DateTime<Utc>),
}

impl SortValue {
    fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Time(a), SortValue::Time(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// A row that can be searched, hidden and sorted locally.
pub trait LocalRow: Clone {
    /// Sortable columns of this row type
    type Field: Copy + Eq + Debug;

    /// `needle` is already lowercased and non-empty.
    fn matches_search(&self, needle: &str) -> bool;

    fn is_inactive(&self) -> bool;

    /// `None` when the row has no value for the column; such rows sort last.
    fn sort_value(&self, field: Self::Field, locale: &str) -> Option<SortValue>;
}

/// Active sort column and direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState<F> {
    pub field: F,
    pub direction: SortDirection,
}

/// Local search/sort state kept next to a fetched page
#[derive(Debug, Clone, PartialEq)]
pub struct LocalView<F> {
    pub search: String,
    pub show_inactive: bool,
    pub sort: Option<SortState<F>>,
    /// Locale used to pick display names for text sorting
    pub locale: String,
}

impl<F> Default for LocalView<F> {
    fn default() -> Self {
        Self {
            search: String::new(),
            show_inactive: true,
            sort: None,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl<F: Copy + Eq> LocalView<F> {
    /// Column header click: the active column flips direction, any other
    /// column becomes active in ascending order.
    pub fn click_column(&mut self, field: F) {
        self.sort = Some(match self.sort {
            Some(current) if current.field == field => SortState {
                field,
                direction: current.direction.reversed(),
            },
            _ => SortState {
                field,
                direction: SortDirection::Asc,
            },
        });
    }
}

/// Rows left after local filtering and sorting of one page
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledPage<R> {
    pub rows: Vec<R>,
    /// Number of rows displayed after local filtering
    pub displayed: usize,
    /// Server pagination, unchanged
    pub pagination: Pagination,
}

/// Apply `view` to the rows of `page`.
pub fn reconcile<R: LocalRow>(page: &PageEnvelope<R>, view: &LocalView<R::Field>) -> ReconciledPage<R> {
    let needle = view.search.trim().to_lowercase();

    let mut rows: Vec<R> = page
        .data
        .iter()
        .filter(|row| view.show_inactive || !row.is_inactive())
        .filter(|row| needle.is_empty() || row.matches_search(&needle))
        .cloned()
        .collect();

    if let Some(sort) = view.sort {
        // sort_by is stable, so rows with equal keys keep server order
        rows.sort_by(|a, b| {
            match (
                a.sort_value(sort.field, &view.locale),
                b.sort_value(sort.field, &view.locale),
            ) {
                (Some(x), Some(y)) => match sort.direction {
                    SortDirection::Asc => x.compare(&y),
                    SortDirection::Desc => y.compare(&x),
                },
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
    }

    ReconciledPage {
        displayed: rows.len(),
        rows,
        pagination: page.pagination,
    }
}
