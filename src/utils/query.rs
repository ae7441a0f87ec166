//! Shared list-endpoint parameters: `ordering`, `page`/`perpage` and `search`.

use serde::Deserialize;

use super::error::AppError;
use crate::config::MAX_PAGE_SIZE;

/// A column a list endpoint lets callers sort by.
pub trait SortField: Sized + Copy {
    fn from_name(name: &str) -> Option<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderingTerm<F> {
    pub field: F,
    pub descending: bool,
}

/// Parses `price,-title` into ordering terms, left to right.
pub fn parse_ordering<F: SortField>(raw: Option<&str>) -> Result<Vec<OrderingTerm<F>>, AppError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (descending, name) = match part.strip_prefix('-') {
                Some(name) => (true, name),
                None => (false, part),
            };
            F::from_name(name)
                .map(|field| OrderingTerm { field, descending })
                .ok_or_else(|| {
                    AppError::field("ordering", format!("Unknown ordering field '{name}'."))
                })
        })
        .collect()
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub perpage: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl PageParams {
    /// Resolves to a limit/offset pair, or `None` when the page can hold no rows.
    pub fn resolve(&self, default_size: i64) -> Option<Page> {
        let limit = match self.perpage {
            Some(n) if n >= 1 => n.min(MAX_PAGE_SIZE),
            _ => default_size,
        };
        let page = self.page.unwrap_or(1);
        if page < 1 {
            return None;
        }
        let offset = (page - 1).checked_mul(limit)?;
        Some(Page { limit, offset })
    }
}

/// Case-insensitive substring pattern for `ILIKE`, with wildcards escaped.
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
