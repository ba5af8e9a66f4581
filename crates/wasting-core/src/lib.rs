//! Shared types for child wasting transition-rate models: the stratum index,
//! wasting categories and model edges, draw-level tables, annual/daily rate
//! conversions, model constants and the common error type.

pub mod constants;
pub mod error;
pub mod rates;
pub mod types;

pub use error::{Result, WastingError};
pub use rates::{annual_to_daily, daily_to_annual, rate_from_duration};
pub use types::{
    CategoryRecord, CategoryTable, ComorbidCause, DrawRecord, DrawTable, Sex, Stratum,
    StratumIndex, Transition, TreatedCategory, WastingCategory,
};
