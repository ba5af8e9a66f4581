mod category;
mod stratum;
mod table;
mod transition;

pub use category::{ComorbidCause, TreatedCategory, WastingCategory};
pub use stratum::{Sex, Stratum, StratumIndex, StratumKey};
pub use table::{CategoryRecord, CategoryTable, DrawRecord, DrawTable};
pub use transition::Transition;
