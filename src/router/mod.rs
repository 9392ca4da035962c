//! Route table, location parsing and route matching.
//!
//! Paths are exact, case-sensitive strings. A parent entry renders its own
//! screen with the matched child inserted into its outlet; anything unmatched
//! falls through to the single wildcard entry.

pub mod route;

pub use route::app_routes;

use crate::screens::Screen;
use crate::{Error, Result};
use std::fmt;

pub const WILDCARD: &str = "*";

/// Current path and query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub pathname: String,
    /// Query string including the leading `?`, or empty
    pub search: String,
}

impl Location {
    /// Parse `"/path?query#hash"`. The hash is dropped; an empty path is `/`.
    pub fn parse(path: &str) -> Self {
        let path = path.split('#').next().unwrap_or_default();
        let (pathname, search) = match path.find('?') {
            Some(i) => (&path[..i], &path[i..]),
            None => (path, ""),
        };
        let pathname = if pathname.is_empty() {
            "/".to_string()
        } else if pathname.starts_with('/') {
            pathname.to_string()
        } else {
            format!("/{}", pathname)
        };
        Location {
            pathname,
            search: search.to_string(),
        }
    }

    /// Location of an absolute URL.
    pub fn from_url(raw: &str) -> Result<Self> {
        let u = url::Url::parse(raw).map_err(|e| Error::Other(format!("bad URL {}: {}", raw, e)))?;
        let search = u.query().map(|q| format!("?{}", q)).unwrap_or_default();
        Ok(Location {
            pathname: u.path().to_string(),
            search,
        })
    }
}

impl Default for Location {
    fn default() -> Self {
        Location::parse("/")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pathname, self.search)
    }
}

/// One navigable screen
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEntry {
    pub path: String,
    pub label: Option<String>,
    pub element: Screen,
    pub children: Vec<RouteEntry>,
}

impl RouteEntry {
    pub fn new(path: impl Into<String>, element: Screen) -> Self {
        RouteEntry {
            path: path.into(),
            label: None,
            element,
            children: Vec::new(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn child(mut self, entry: RouteEntry) -> Self {
        self.children.push(entry);
        self
    }

    pub fn is_wildcard(&self) -> bool {
        self.path.contains(WILDCARD)
    }

    /// Menu text: the label, falling back to the path.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.path)
    }
}

/// Ordered, immutable route table
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// Build a table. Exactly one top-level entry must be the wildcard.
    pub fn new(entries: Vec<RouteEntry>) -> Result<Self> {
        let wildcards = entries.iter().filter(|e| e.path == WILDCARD).count();
        if wildcards != 1 {
            return Err(Error::Config(format!(
                "route table needs exactly one \"*\" entry, found {}",
                wildcards
            )));
        }
        Ok(RouteTable { entries })
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Top-level non-wildcard entries, in table order.
    pub fn menu(&self) -> Vec<&RouteEntry> {
        self.entries.iter().filter(|e| !e.is_wildcard()).collect()
    }

    /// Matched chain for `location`, outermost first. Never empty.
    pub fn resolve(&self, location: &Location) -> Vec<&RouteEntry> {
        let path = location.pathname.as_str();
        for entry in self.entries.iter().filter(|e| !e.is_wildcard()) {
            if entry.path == path {
                return vec![entry];
            }
            if let Some(child) = entry.children.iter().find(|c| c.path == path) {
                return vec![entry, child];
            }
        }
        self.entries
            .iter()
            .filter(|e| e.path == WILDCARD)
            .take(1)
            .collect()
    }

    /// Render the matched chain innermost-first, feeding each rendered screen
    /// into its parent's outlet.
    pub fn compose<F>(&self, location: &Location, mut render: F) -> crate::dom::Node
    where
        F: FnMut(&RouteEntry, crate::dom::Node) -> crate::dom::Node,
    {
        self.resolve(location)
            .into_iter()
            .rev()
            .fold(crate::dom::Node::empty(), |outlet, entry| render(entry, outlet))
    }
}

/// A menu link is active only when the location is exactly its path.
pub fn is_active(path: &str, location: &Location) -> bool {
    location.pathname == path
}

/// Whether a link to `path` should be followable from `location`; `false`
/// when it points at the page being shown.
pub fn links_location(path: &str, location: &Location) -> bool {
    !is_active(path, location)
}
