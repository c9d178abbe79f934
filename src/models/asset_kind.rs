//! Asset kind classification driving compaction and bundle grouping.

/// The kind of an uploaded asset, inferred from its file extension.
///
/// Only scripts and styles participate in bundling; everything else is
/// stored as-is and never contributes to an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// JavaScript source (`.js`).
    Script,
    /// CSS stylesheet (`.css`).
    Style,
    /// Any other extension (or no extension at all).
    Other,
}

impl AssetKind {
    /// Classify a file name by its extension, ASCII-case-insensitively.
    pub fn from_name(name: &str) -> Self {
        let ext = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext,
            _ => return Self::Other,
        };
        if ext.eq_ignore_ascii_case("js") {
            Self::Script
        } else if ext.eq_ignore_ascii_case("css") {
            Self::Style
        } else {
            Self::Other
        }
    }

    /// Stored name of the aggregate object for this kind, prefixed with the
    /// representative identity of the batch. `None` for unbundled kinds.
    ///
    /// Both aggregates carry a `.js` extension; that is the delivery contract
    /// consumers of the bundles rely on.
    pub fn bundle_object_name(&self, identity: &str) -> Option<String> {
        match self {
            Self::Script => Some(format!("{identity}bundleJS.js")),
            Self::Style => Some(format!("{identity}bundleCSS.js")),
            Self::Other => None,
        }
    }
}
