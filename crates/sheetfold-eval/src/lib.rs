pub mod cache;
pub mod collect;
pub mod config;
pub mod flags;
pub mod rangefunc;
pub mod telemetry;
pub mod traits;

pub use cache::{CacheStats, CollectCache, RecalcListener, RecalcSignal};
pub use collect::{FloatCollection, FloatPairs, Floats, Ownership};
pub use config::{CollectConfig, ConfigError};
pub use flags::{CollectFlags, IterFlags};
pub use traits::{ArgExpr, EvaluationContext};

#[cfg(test)]
pub mod test_workbook;

#[cfg(test)]
mod tests;
