pub mod card;
pub mod quality;
pub mod review_result;
pub mod session;
pub mod sm2;
pub mod snapshot;
pub mod stats;

pub use card::{Card, CardContent, CardHistory};
pub use quality::Quality;
pub use review_result::ReviewResult;
pub use session::Session;
pub use snapshot::Snapshot;
pub use stats::{AggregateStats, IntervalHistogram, Stats};
