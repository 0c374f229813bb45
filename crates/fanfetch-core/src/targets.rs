//! Task source: turns caller-supplied locators (or the default list) into
//! validated fetch targets.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::url_model;

/// Built-in default targets, used when no locators are given on the command line.
pub const BUILTIN_TARGETS: &[&str] = &[
    "https://pic.rutubelist.ru/video/82/10/8210b7ee82f9973bb2ca7aebe59f4b01.jpg",
    "https://celes.club/uploads/posts/2021-12/1640827655_89-celes-club-p-zima-vecher-priroda-krasivo-foto-99.jpg",
    "https://damion.top/uploads/posts/2022-02/1645259482_36-damion-club-p-uyutnii-zimnii-vecher-priroda-39.jpg",
    "https://disgustingmen.com/wp-content/uploads/2017/12/richard-savoi-5.jpg",
    "https://adonius.club/uploads/posts/2022-07/thumbs/1657136474_59-adonius-club-p-zimnii-vecher-v-derevne-priroda-krasivo-fo-66.jpg",
];

/// One locator to fetch plus the file name its payload is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchTarget {
    locator: String,
    destination_name: String,
}

impl FetchTarget {
    /// Validates a locator: it must parse as an absolute URL with a
    /// hierarchical path whose final segment is a usable file name. The
    /// locator is kept exactly as given; surrounding whitespace is an error.
    /// `index` is only used in the error for empty input.
    pub fn parse(locator: &str, index: usize) -> Result<Self, ConfigError> {
        let malformed = |reason: &str| ConfigError::MalformedLocator {
            locator: locator.to_string(),
            reason: reason.to_string(),
        };
        if locator.trim().is_empty() {
            return Err(ConfigError::EmptyLocator { index });
        }
        if locator.trim() != locator {
            return Err(malformed("surrounding whitespace"));
        }
        let parsed = url::Url::parse(locator).map_err(|e| malformed(&e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(malformed("locator has no hierarchical path"));
        }
        let destination_name =
            url_model::destination_name(locator).ok_or_else(|| ConfigError::NoDestinationName {
                locator: locator.to_string(),
            })?;
        Ok(Self {
            locator: locator.to_string(),
            destination_name,
        })
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// File name under which the payload is written.
    pub fn destination_name(&self) -> &str {
        &self.destination_name
    }
}

/// Where targets come from when the caller passes none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSource {
    defaults: Vec<String>,
}

impl TargetSource {
    /// Falls back to [`BUILTIN_TARGETS`].
    pub fn builtin() -> Self {
        Self::with_defaults(BUILTIN_TARGETS.iter().map(|s| s.to_string()).collect())
    }

    /// Falls back to the given list; an empty list disables default substitution.
    pub fn with_defaults(defaults: Vec<String>) -> Self {
        Self { defaults }
    }

    /// No fallback: an empty explicit list is a configuration error.
    pub fn without_defaults() -> Self {
        Self::with_defaults(Vec::new())
    }

    pub fn defaults(&self) -> &[String] {
        &self.defaults
    }
}

impl Default for TargetSource {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Resolves the ordered list of targets for a run.
///
/// A non-empty `explicit_list` is used verbatim (order kept, duplicates
/// allowed); otherwise the source's defaults are used. Every entry is
/// validated before anything is returned, so a single bad locator fails the
/// whole resolution.
pub fn resolve_targets(
    explicit_list: Option<&[String]>,
    source: &TargetSource,
) -> Result<Vec<FetchTarget>, ConfigError> {
    let raw: &[String] = match explicit_list {
        Some(list) if !list.is_empty() => list,
        _ => source.defaults(),
    };
    if raw.is_empty() {
        return Err(ConfigError::NoTargets);
    }
    let targets = raw
        .iter()
        .enumerate()
        .map(|(i, s)| FetchTarget::parse(s, i))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(count = targets.len(), "resolved fetch targets");
    Ok(targets)
}
