//! Publication state resolution.
//!
//! A request selects a [`PublicationState`]; the state yields one
//! [`PublicationFilter`] that decides visibility for root entries and for
//! every entry reached while populating, at any depth.

use std::fmt;
use std::str::FromStr;

use vellum_sdk::types::ContentTypeDefinition;

use crate::error::AppError;
use crate::models::Entry;
use crate::store::StoreScope;

/// Query parameter carrying the publication state.
pub const PUBLICATION_STATE_PARAM: &str = "publicationState";

/// Which lifecycle states a read may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublicationState {
    /// No parameter given. Same visibility as `Live`.
    #[default]
    Default,
    /// Published entries only.
    Live,
    /// Drafts and published entries.
    Preview,
}

impl PublicationState {
    /// Resolve the state from the raw query parameter.
    ///
    /// Only an absent parameter falls back to `Default`; every other value
    /// must name a known state.
    pub fn from_query(value: Option<&str>) -> Result<Self, AppError> {
        match value {
            None => Ok(PublicationState::Default),
            Some(raw) => raw.parse(),
        }
    }

    /// The visibility predicate for this state.
    pub fn predicate(self) -> PublicationFilter {
        PublicationFilter {
            published_only: !matches!(self, PublicationState::Preview),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PublicationState::Default => "default",
            PublicationState::Live => "live",
            PublicationState::Preview => "preview",
        }
    }
}

impl FromStr for PublicationState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "live" => Ok(PublicationState::Live),
            "preview" => Ok(PublicationState::Preview),
            other => Err(AppError::invalid_param(PUBLICATION_STATE_PARAM, other)),
        }
    }
}

impl fmt::Display for PublicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility predicate derived from a [`PublicationState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicationFilter {
    published_only: bool,
}

impl PublicationFilter {
    /// Whether `entry` (of `content_type`) is visible.
    ///
    /// Types without draft & publish have no drafts: all their entries pass.
    pub fn admits(&self, content_type: &ContentTypeDefinition, entry: &Entry) -> bool {
        !self.published_only || !content_type.draft_and_publish || entry.is_published()
    }

    /// Store push-down equivalent of [`admits`](Self::admits) for a whole type.
    pub fn scope(&self, content_type: &ContentTypeDefinition) -> StoreScope {
        if self.published_only && content_type.draft_and_publish {
            StoreScope::PublishedOnly
        } else {
            StoreScope::All
        }
    }

    /// Keep the admitted entries, preserving order.
    pub fn retain(&self, content_type: &ContentTypeDefinition, entries: Vec<Entry>) -> Vec<Entry> {
        entries
            .into_iter()
            .filter(|e| self.admits(content_type, e))
            .collect()
    }
}
