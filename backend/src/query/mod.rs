//! Sorting, pagination and filtering over post snapshots.
//!
//! Everything here is a pure function of a snapshot taken from the store,
//! so no lock is held while a query runs.

use std::num::IntErrorKind;

use crate::errors::AppError;
use crate::models::{ListPostsQuery, Post, SearchPostsQuery};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PER_PAGE: i64 = 10;

/// Post field a listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Content,
}

impl SortField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "title" => Some(SortField::Title),
            "content" => Some(SortField::Content),
            _ => None,
        }
    }

    fn key<'a>(&self, post: &'a Post) -> &'a str {
        match self {
            SortField::Title => &post.title,
            SortField::Content => &post.content,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Validate the raw `sort` and `direction` parameters.
    ///
    /// Without a sort field the direction is ignored, whatever its value.
    pub fn parse(sort: Option<&str>, direction: Option<&str>) -> Result<Option<Self>, AppError> {
        let Some(sort) = sort.filter(|s| !s.is_empty()) else {
            return Ok(None);
        };

        let field = SortField::parse(sort).ok_or_else(|| {
            AppError::InvalidParameter(
                "Invalid sort field. Must be 'title' or 'content'.".to_string(),
            )
        })?;
        let direction = direction
            .and_then(SortDirection::parse)
            .ok_or_else(|| {
                AppError::InvalidParameter(
                    "Invalid sort direction. Must be 'asc' or 'desc'.".to_string(),
                )
            })?;

        Ok(Some(Self { field, direction }))
    }

    /// Stable sort: posts with equal keys keep their relative order in both directions.
    pub fn apply(&self, posts: &mut [Post]) {
        posts.sort_by(|a, b| {
            let ordering = self.field.key(a).cmp(self.field.key(b));
            match self.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }
}

/// Page window over a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Pagination {
    /// Values that do not parse as integers fall back to the defaults.
    ///
    /// Integers beyond the `i64` range saturate, so a huge page still lands
    /// past the end of the list.
    pub fn parse(page: Option<&str>, per_page: Option<&str>) -> Self {
        Self {
            page: parse_int(page, DEFAULT_PAGE),
            per_page: parse_int(per_page, DEFAULT_PER_PAGE),
        }
    }

    /// Half-open bounds `[start, end)` before clamping.
    pub fn bounds(&self) -> (i64, i64) {
        let start = self.page.saturating_sub(1).saturating_mul(self.per_page);
        let end = start.saturating_add(self.per_page);
        (start, end)
    }

    /// Slice the window out of `posts`.
    ///
    /// Negative bounds count back from the end of the list, then both bounds
    /// clamp to the list; an empty or inverted window yields nothing.
    pub fn apply(&self, posts: Vec<Post>) -> Vec<Post> {
        let len = posts.len();
        let (start, end) = self.bounds();
        let start = resolve_bound(start, len);
        let end = resolve_bound(end, len);

        if start >= end {
            return Vec::new();
        }
        posts.into_iter().skip(start).take(end - start).collect()
    }
}

fn parse_int(raw: Option<&str>, default: i64) -> i64 {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<i64>() {
        Ok(value) => value,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => default,
        },
    }
}

fn resolve_bound(bound: i64, len: usize) -> usize {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let resolved = if bound < 0 {
        bound.saturating_add(len_i).max(0)
    } else {
        bound.min(len_i)
    };
    // resolved lies in [0, len]
    usize::try_from(resolved).unwrap_or(0)
}

/// Validated form of the listing query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListOptions {
    pub sort: Option<SortSpec>,
    pub pagination: Pagination,
}

impl ListOptions {
    pub fn from_query(query: &ListPostsQuery) -> Result<Self, AppError> {
        Ok(Self {
            sort: SortSpec::parse(query.sort.as_deref(), query.direction.as_deref())?,
            pagination: Pagination::parse(query.page.as_deref(), query.per_page.as_deref()),
        })
    }
}

/// Sort (when requested) then paginate a snapshot.
pub fn list(mut posts: Vec<Post>, options: &ListOptions) -> Vec<Post> {
    if let Some(sort) = &options.sort {
        sort.apply(&mut posts);
    }
    options.pagination.apply(posts)
}

/// Case-insensitive substring filter on title and/or content.
///
/// Empty terms are ignored; with both terms a post must match both. Store
/// order is kept and no pagination applies.
pub fn search(posts: Vec<Post>, query: &SearchPostsQuery) -> Vec<Post> {
    let title = lowered_term(query.title.as_deref());
    let content = lowered_term(query.content.as_deref());

    posts
        .into_iter()
        .filter(|post| {
            title
                .as_deref()
                .map_or(true, |t| post.title.to_lowercase().contains(t))
        })
        .filter(|post| {
            content
                .as_deref()
                .map_or(true, |c| post.content.to_lowercase().contains(c))
        })
        .collect()
}

fn lowered_term(term: Option<&str>) -> Option<String> {
    term.filter(|t| !t.is_empty()).map(str::to_lowercase)
}
