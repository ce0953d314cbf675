//! Populate path parsing.
//!
//! `populate=categories&populate=comp.countries` becomes a tree:
//!
//! ```text
//! root
//! ├── categories
//! └── comp
//!     └── countries
//! ```
//!
//! A `*` segment marks every relation and component at that level.

use std::collections::BTreeMap;

use crate::error::AppError;

/// Query parameter carrying populate paths.
pub const POPULATE_PARAM: &str = "populate";

const WILDCARD: &str = "*";

/// Merged populate paths of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulateTree {
    wildcard: bool,
    children: BTreeMap<String, PopulateTree>,
}

impl PopulateTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a list of dotted paths.
    pub fn parse<I, S>(paths: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = Self::new();
        for path in paths {
            tree.insert(path.as_ref())?;
        }
        Ok(tree)
    }

    /// Merge one dotted path into the tree. Blank paths are ignored.
    pub fn insert(&mut self, path: &str) -> Result<(), AppError> {
        let path = path.trim();
        if path.is_empty() {
            return Ok(());
        }

        let segments: Vec<&str> = path.split('.').map(str::trim).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(AppError::invalid_param(POPULATE_PARAM, path));
        }

        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| AppError::invalid_param(POPULATE_PARAM, path))?;

        let mut node = self;
        for segment in parents {
            if *segment == WILDCARD {
                // `*` only makes sense as the final segment
                return Err(AppError::invalid_param(POPULATE_PARAM, path));
            }
            node = node.children.entry((*segment).to_string()).or_default();
        }

        if *last == WILDCARD {
            node.wildcard = true;
        } else {
            node.children.entry((*last).to_string()).or_default();
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        !self.wildcard && self.children.is_empty()
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Explicitly named children, in name order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &PopulateTree)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn child(&self, name: &str) -> Option<&PopulateTree> {
        self.children.get(name)
    }

    /// Longest path length in segments.
    pub fn depth(&self) -> usize {
        let nested = self.children.values().map(|c| c.depth() + 1).max();
        match nested {
            Some(d) => d,
            None => usize::from(self.wildcard),
        }
    }
}
