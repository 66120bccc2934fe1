/// Default page size for list endpoints
pub const DEFAULT_LIMIT: i64 = 10;

/// Default offset for list endpoints
pub const DEFAULT_OFFSET: i64 = 0;

/// Language tried first when picking a category's display name
pub const DEFAULT_LOCALE: &str = "pt";

// =============================================================================
// CACHE TAGS
// =============================================================================

/// Cache tag shared by every cached category read
pub const CATEGORIES_CACHE_TAG: &str = "categories";
