use sheetfold_common::SHEET_ROWS;
use thiserror::Error;

/// Tunables for the collection caches.
#[derive(Clone, Debug)]
pub struct CollectConfig {
    /// When false every request is collected afresh and nothing is stored.
    pub cache_enabled: bool,
    /// Row limit of the sheets being cached; the combined cache budget is
    /// `rows_limit * 32` elements.
    pub rows_limit: u32,
    /// Ranges narrower *and* shorter than this are not worth caching...
    pub min_cached_side: u32,
    /// ...unless they still hold at least this many cells.
    pub min_cached_cells: u32,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            rows_limit: SHEET_ROWS,
            min_cached_side: 4,
            min_cached_cells: 16,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("rows_limit must be positive")]
    ZeroRowsLimit,
    #[error("cacheability thresholds must be positive (side {side}, cells {cells})")]
    ZeroThreshold { side: u32, cells: u32 },
}

impl CollectConfig {
    /// Config with caching switched off.
    pub fn uncached() -> Self {
        Self {
            cache_enabled: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows_limit == 0 {
            return Err(ConfigError::ZeroRowsLimit);
        }
        if self.min_cached_side == 0 || self.min_cached_cells == 0 {
            return Err(ConfigError::ZeroThreshold {
                side: self.min_cached_side,
                cells: self.min_cached_cells,
            });
        }
        Ok(())
    }

    /// Total cached size above which both caches are dropped.
    pub fn size_budget(&self) -> usize {
        self.rows_limit as usize * 32
    }
}
