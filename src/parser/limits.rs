//! Implementation limits enforced while decoding.
//!
//! Counts in a binary are checked against these before anything is allocated
//! so a few hostile bytes cannot claim billions of entries. The values follow
//! the limits shared by the mainstream engines.

pub const MAX_TYPES: u32 = 1_000_000;
pub const MAX_FUNCTIONS: u32 = 1_000_000;
pub const MAX_IMPORTS: u32 = 1_000_000;
pub const MAX_EXPORTS: u32 = 1_000_000;
pub const MAX_GLOBALS: u32 = 1_000_000;
pub const MAX_TABLES: u32 = 100_000;
pub const MAX_MEMORIES: u32 = 100_000;
pub const MAX_DATA_SEGMENTS: u32 = 100_000;
pub const MAX_ELEMENT_SEGMENTS: u32 = 100_000;
pub const MAX_ELEMENT_ITEMS: u32 = 10_000_000;

pub const MAX_FUNCTION_PARAMS: u32 = 1_000;
pub const MAX_FUNCTION_RETURNS: u32 = 1_000;

/// Declared locals per function, parameters excluded.
pub const MAX_FUNCTION_LOCALS: u32 = 50_000;

pub const MAX_BR_TABLE_LABELS: u32 = 65_536;
pub const MAX_SELECT_TYPES: u32 = 1_000;

/// 4 GiB of 64 KiB pages.
pub const MAX_MEMORY_PAGES: u32 = 65_536;
