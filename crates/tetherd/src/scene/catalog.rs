//! Local stand-in for the third-party asset catalog.
//!
//! Only the status report and category listing are served; downloading and
//! searching need the remote HTTP client, which the host does not ship.

use std::collections::BTreeMap;

use serde::Serialize;
use strum::{Display, EnumString};

const ENABLED_MESSAGE: &str = "Asset catalog integration is enabled and ready to use.";
const DISABLED_MESSAGE: &str = "Asset catalog integration is disabled. Set asset_catalog = true \
     (or TETHER_ASSET_CATALOG=true) and restart the host to enable it.";

/// Asset families exposed by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum AssetType {
    /// Environment maps.
    Hdris,
    /// Surface textures.
    Textures,
    /// 3D models.
    Models,
    /// Every family merged.
    All,
}

impl AssetType {
    /// Accepted spellings, for error messages.
    pub const NAMES: &'static str = "hdris, textures, models, all";

    const fn categories(self) -> &'static [(&'static str, u32)] {
        match self {
            Self::Hdris => &[
                ("indoor", 2),
                ("outdoor", 5),
                ("skies", 3),
                ("studio", 1),
            ],
            Self::Textures => &[
                ("brick", 3),
                ("concrete", 2),
                ("fabric", 2),
                ("wood", 4),
            ],
            Self::Models => &[("furniture", 3), ("nature", 4), ("props", 6)],
            Self::All => &[],
        }
    }
}

/// Result of `get_asset_catalog_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogStatus {
    /// Whether the catalog handlers are registered.
    pub enabled: bool,
    /// Human-readable explanation of the state.
    pub message: &'static str,
}

/// Category listing with asset counts per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Categories {
    /// Asset count keyed by category name.
    pub categories: BTreeMap<&'static str, u32>,
}

/// Catalog handle; disabled unless the configuration opts in.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetCatalog {
    enabled: bool,
}

impl AssetCatalog {
    /// Catalog handle in the given state.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Reports whether the catalog is enabled.
    #[must_use]
    pub const fn status(&self) -> CatalogStatus {
        CatalogStatus {
            enabled: self.enabled,
            message: if self.enabled {
                ENABLED_MESSAGE
            } else {
                DISABLED_MESSAGE
            },
        }
    }

    /// Categories for one asset type; `All` merges every family.
    #[must_use]
    pub fn categories(&self, asset_type: AssetType) -> Categories {
        let families = match asset_type {
            AssetType::All => vec![AssetType::Hdris, AssetType::Textures, AssetType::Models],
            single => vec![single],
        };
        let mut categories = BTreeMap::new();
        for family in families {
            for (name, count) in family.categories() {
                *categories.entry(*name).or_insert(0) += count;
            }
        }
        Categories { categories }
    }
}
