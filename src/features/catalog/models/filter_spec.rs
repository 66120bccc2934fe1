use uuid::Uuid;

use crate::features::catalog::models::CatalogStatus;
use crate::shared::types::PageWindow;

/// Which relations to attach to each returned item.
///
/// Expansion never changes which rows match or their order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Expansion {
    /// Attach the provider with its nested user
    pub provider: bool,
    /// Attach the category with its translations
    pub category: bool,
}

impl Expansion {
    pub fn all() -> Self {
        Self {
            provider: true,
            category: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

/// Validated list filter for a catalog family.
///
/// Every field left as `None` is simply not applied. `search` matches
/// title or description, case-insensitively, and is never blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub category_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub status: Option<CatalogStatus>,
    pub search: Option<String>,
    pub window: PageWindow,
    pub expand: Expansion,
}

impl FilterSpec {
    /// Stable cache key covering every field that affects the result.
    pub fn cache_key(&self) -> String {
        fn part<T: ToString>(value: &Option<T>) -> String {
            value.as_ref().map(ToString::to_string).unwrap_or_default()
        }

        format!(
            "list:c={}:p={}:s={}:l={}:o={}:ip={}:ic={}:q={}",
            part(&self.category_id),
            part(&self.provider_id),
            part(&self.status),
            self.window.limit,
            self.window.offset,
            self.expand.provider,
            self.expand.category,
            // free text goes last so it cannot shadow the fixed fields
            self.search.as_deref().unwrap_or_default().to_lowercase(),
        )
    }
}
