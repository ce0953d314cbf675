//! Read request parameters.
//!
//! Parses the raw query string of a content API read into a [`ReadQuery`].
//! Accepted keys:
//!
//! - `publicationState=live|preview`
//! - `populate=a,b.c`, repeated `populate=`, `populate[]=` or `populate[0]=`
//! - `pagination[page]=` and `pagination[pageSize]=` (or bare `page=` and
//!   `pageSize=`)
//!
//! Unrecognized keys are ignored.

use url::form_urlencoded;

use crate::error::AppError;
use crate::pagination::{PageLimits, PageParams};
use crate::populate::{POPULATE_PARAM, PopulateTree};
use crate::publication::{PUBLICATION_STATE_PARAM, PublicationState};

const PAGE_PARAM: &str = "pagination[page]";
const PAGE_SIZE_PARAM: &str = "pagination[pageSize]";

/// Limits applied to every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// Deepest populate path accepted, in segments.
    pub max_populate_depth: usize,
}

impl Default for ReadLimits {
    fn default() -> Self {
        let page = PageLimits::default();
        Self {
            default_page_size: page.default_page_size,
            max_page_size: page.max_page_size,
            max_populate_depth: 5,
        }
    }
}

impl ReadLimits {
    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
        }
    }
}

/// Parsed parameters of one read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadQuery {
    pub state: PublicationState,
    pub populate: PopulateTree,
    pub page: PageParams,
}

impl ReadQuery {
    /// Parse a raw (still percent-encoded) query string.
    pub fn parse(raw: Option<&str>, limits: &ReadLimits) -> Result<Self, AppError> {
        let mut state: Option<String> = None;
        let mut populate = PopulateTree::new();
        let mut page: Option<String> = None;
        let mut page_size: Option<String> = None;

        for (key, value) in form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                PUBLICATION_STATE_PARAM => {
                    // A repeated state is ambiguous
                    if let Some(previous) = state.replace(value.to_string()) {
                        return Err(AppError::invalid_param(
                            PUBLICATION_STATE_PARAM,
                            format!("{previous},{value}"),
                        ));
                    }
                }
                PAGE_PARAM | "page" => page = Some(value.into_owned()),
                PAGE_SIZE_PARAM | "pageSize" => page_size = Some(value.into_owned()),
                k if is_populate_key(k) => {
                    for path in value.split(',') {
                        populate.insert(path)?;
                    }
                }
                k if k.starts_with("populate[") => {
                    return Err(AppError::invalid_param(POPULATE_PARAM, k.to_string()));
                }
                other => tracing::trace!(key = %other, "ignoring unknown query parameter"),
            }
        }

        Ok(Self {
            state: PublicationState::from_query(state.as_deref())?,
            populate,
            page: PageParams::from_query(page.as_deref(), page_size.as_deref(), limits.page_limits())?,
        })
    }
}

/// `populate`, `populate[]` or `populate[<index>]`.
fn is_populate_key(key: &str) -> bool {
    if key == POPULATE_PARAM {
        return true;
    }
    key.strip_prefix("populate[")
        .and_then(|rest| rest.strip_suffix(']'))
        .is_some_and(|index| index.chars().all(|c| c.is_ascii_digit()))
}
