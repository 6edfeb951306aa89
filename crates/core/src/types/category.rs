//! Category filter for the product grid.

use core::convert::Infallible;
use core::fmt;
use core::str::FromStr;

/// Label that selects every category.
pub const ALL_CATEGORIES: &str = "All";

/// Which products the grid shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    /// Every product, in catalog order.
    #[default]
    All,
    /// Only products whose category equals the label exactly.
    Named(String),
}

impl CategoryFilter {
    /// Parse a filter label. `All` (any case) or a blank label selects everything.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || label.eq_ignore_ascii_case(ALL_CATEGORIES) {
            Self::All
        } else {
            Self::Named(label.to_string())
        }
    }

    /// Build from an optional query value.
    #[must_use]
    pub fn from_optional(label: Option<&str>) -> Self {
        label.map_or(Self::All, Self::parse)
    }

    /// Whether a product category passes this filter.
    #[must_use]
    pub fn matches(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(label) => label == category,
        }
    }

    /// Label as it appears in links and forms.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::All => ALL_CATEGORIES,
            Self::Named(label) => label,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CategoryFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}
