//! # burrow-filter
//!
//! The `--filter KEY==VALUE` / `--filter KEY!=VALUE` interpreter shared by
//! every Burrow list command.
//!
//! ```
//! use burrow_filter::{apply_with, parse};
//!
//! let names = vec!["ws1".to_string(), "ws2".to_string(), "db1".to_string()];
//! let filters = parse(&["NAME==ws*"])?;
//! let kept = apply_with(names, &["name"], |n, _| vec![n.clone()], &filters[0]);
//! assert_eq!(kept, vec!["ws1", "ws2"]);
//! # Ok::<(), burrow_filter::FilterError>(())
//! ```
//!
//! Filters combine with AND. A filter naming a key the collection does not
//! have is logged and skipped instead of failing the command, so an older
//! CLI keeps listing against a newer server.

#![forbid(unsafe_code)]

pub mod error;
pub mod expr;
pub mod glob;

use tracing::{debug, warn};

pub use error::{FilterError, Result};
pub use expr::{Filter, Operator, parse};
pub use glob::Glob;

/// A row type that exposes named, possibly multi-valued columns to filters.
pub trait Filterable {
    /// Lowercase column names this type can be filtered on.
    fn filter_keys() -> &'static [&'static str];

    /// Values of column `key` (already lowercased) for this item.
    fn filter_values(&self, key: &str) -> Vec<String>;
}

/// Apply one filter to a [`Filterable`] collection.
pub fn apply<T: Filterable>(items: Vec<T>, filter: &Filter) -> Vec<T> {
    apply_with(items, T::filter_keys(), T::filter_values, filter)
}

/// Apply every filter in order (logical AND).
pub fn apply_all<T: Filterable>(items: Vec<T>, filters: &[Filter]) -> Vec<T> {
    filters.iter().fold(items, |items, f| apply(items, f))
}

/// Apply one filter using an ad-hoc column extractor.
///
/// `keys` lists the columns `extract` understands. If the filter's key is
/// not among them the collection is returned unchanged and a warning is
/// logged.
pub fn apply_with<T, F>(items: Vec<T>, keys: &[&str], extract: F, filter: &Filter) -> Vec<T>
where
    F: Fn(&T, &str) -> Vec<String>,
{
    if !keys.iter().any(|k| k.eq_ignore_ascii_case(filter.key())) {
        warn!(
            filter = %filter,
            known = %keys.join(","),
            "unknown filter key, ignoring"
        );
        return items;
    }

    let before = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter(|item| filter.matches(&extract(item, filter.key())))
        .collect();
    debug!(filter = %filter, before, after = kept.len(), "applied filter");
    kept
}
