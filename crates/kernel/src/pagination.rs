//! Count and page slicing over a filtered root set.
//!
//! Totals are always taken from the filtered, unsliced set, so the count a
//! client sees matches the rows it can actually page through.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Requested window over the filtered set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageParams {
    /// No `page`/`pageSize` given: return everything.
    #[default]
    Unbounded,
    /// 1-indexed page of `page_size` rows.
    Window { page: u32, page_size: u32 },
}

/// Bounds for page windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 25,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

/// Hard ceiling for `pageSize` unless configured lower.
pub const MAX_PAGE_SIZE: u32 = 100;

impl PageParams {
    /// Build from raw `page` / `pageSize` query values.
    pub fn from_query(
        page: Option<&str>,
        page_size: Option<&str>,
        limits: PageLimits,
    ) -> Result<Self, AppError> {
        if page.is_none() && page_size.is_none() {
            return Ok(PageParams::Unbounded);
        }

        let page = match page {
            Some(raw) => parse_positive("page", raw)?,
            None => 1,
        };
        let page_size = match page_size {
            Some(raw) => parse_positive("pageSize", raw)?,
            None => limits.default_page_size,
        };

        if page_size > limits.max_page_size {
            tracing::debug!(
                requested = page_size,
                capped = limits.max_page_size,
                "pageSize exceeds maximum, capping"
            );
        }

        Ok(PageParams::Window {
            page,
            page_size: page_size.clamp(1, limits.max_page_size.max(1)),
        })
    }

    /// Row offset and limit of a window; `None` when unbounded.
    pub fn offset_limit(self) -> Option<(u64, u64)> {
        match self {
            PageParams::Unbounded => None,
            PageParams::Window { page, page_size } => {
                let page_size = u64::from(page_size.max(1));
                Some((u64::from(page.max(1) - 1) * page_size, page_size))
            }
        }
    }

    /// Metadata for this window over `total` visible rows.
    pub fn paginate(self, total: u64) -> Pagination {
        match self {
            PageParams::Unbounded => Pagination {
                page: 1,
                page_size: u32::try_from(total).unwrap_or(u32::MAX),
                page_count: u32::from(total > 0),
                total,
            },
            PageParams::Window { page, page_size } => {
                let page_size = page_size.max(1);
                Pagination {
                    page: page.max(1),
                    page_size,
                    page_count: u32::try_from(total.div_ceil(u64::from(page_size)))
                        .unwrap_or(u32::MAX),
                    total,
                }
            }
        }
    }
}

fn parse_positive(name: &'static str, raw: &str) -> Result<u32, AppError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::invalid_param(name, raw)),
    }
}

/// Pagination metadata returned with collection reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page number (1-indexed).
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
    /// Total number of pages.
    pub page_count: u32,
    /// Total visible rows (before slicing).
    pub total: u64,
}

/// Count `filtered` and cut the requested window out of it.
///
/// A page past the end yields an empty slice; `total` never changes.
pub fn count_and_slice<T>(filtered: Vec<T>, params: PageParams) -> (Vec<T>, Pagination) {
    let pagination = params.paginate(filtered.len() as u64);

    let slice = match params.offset_limit() {
        None => filtered,
        Some((offset, limit)) => filtered
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect(),
    };

    (slice, pagination)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_returns_everything() {
        let (rows, meta) = count_and_slice(vec![1, 2, 3], PageParams::Unbounded);

        assert_eq!(rows, vec![1, 2, 3]);
        assert_eq!(meta.total, rows.len() as u64);
        assert_eq!(meta.page, 1);
        assert_eq!(meta.page_size, 3);
        assert_eq!(meta.page_count, 1);
    }

    #[test]
    fn unbounded_empty() {
        let (rows, meta) = count_and_slice(Vec::<u8>::new(), PageParams::Unbounded);
        assert!(rows.is_empty());
        assert_eq!(meta.total, 0);
        assert_eq!(meta.page_count, 0);
    }

    #[test]
    fn window_slices_after_counting() {
        let rows: Vec<u32> = (1..=25).collect();
        let (page, meta) = count_and_slice(
            rows,
            PageParams::Window {
                page: 3,
                page_size: 10,
            },
        );

        assert_eq!(page, vec![21, 22, 23, 24, 25]);
        assert_eq!(meta.total, 25);
        assert_eq!(meta.page_count, 3);
    }

    #[test]
    fn page_past_end_is_empty_not_error() {
        let (page, meta) = count_and_slice(
            vec![1, 2],
            PageParams::Window {
                page: 9,
                page_size: 10,
            },
        );
        assert!(page.is_empty());
        assert_eq!(meta.total, 2);
        assert_eq!(meta.page, 9);
    }

    #[test]
    fn from_query_absent_is_unbounded() {
        assert_eq!(
            PageParams::from_query(None, None, PageLimits::default()).unwrap(),
            PageParams::Unbounded
        );
    }

    #[test]
    fn from_query_fills_missing_half() {
        let limits = PageLimits::default();
        assert_eq!(
            PageParams::from_query(Some("2"), None, limits).unwrap(),
            PageParams::Window {
                page: 2,
                page_size: 25
            }
        );
        assert_eq!(
            PageParams::from_query(None, Some("5"), limits).unwrap(),
            PageParams::Window {
                page: 1,
                page_size: 5
            }
        );
    }

    #[test]
    fn from_query_caps_page_size() {
        let params = PageParams::from_query(Some("1"), Some("5000"), PageLimits::default()).unwrap();
        assert_eq!(
            params,
            PageParams::Window {
                page: 1,
                page_size: MAX_PAGE_SIZE
            }
        );
    }

    #[test]
    fn from_query_rejects_garbage() {
        for (page, size) in [(Some("0"), None), (Some("abc"), None), (None, Some("-1"))] {
            let err = PageParams::from_query(page, size, PageLimits::default()).unwrap_err();
            assert!(matches!(err, AppError::InvalidQueryParameter { .. }));
        }
    }

    #[test]
    fn pagination_serializes_camel_case() {
        let json = serde_json::to_value(Pagination {
            page: 1,
            page_size: 25,
            page_count: 1,
            total: 2,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"page": 1, "pageSize": 25, "pageCount": 1, "total": 2})
        );
    }

    #[test]
    fn window_offsets() {
        assert_eq!(PageParams::Unbounded.offset_limit(), None);
        assert_eq!(
            PageParams::Window {
                page: 3,
                page_size: 10
            }
            .offset_limit(),
            Some((20, 10))
        );
    }

    #[test]
    fn paginate_from_external_total() {
        let meta = PageParams::Window {
            page: 1,
            page_size: 1,
        }
        .paginate(3);
        assert_eq!(meta.page_count, 3);
        assert_eq!(meta.total, 3);
    }
}
