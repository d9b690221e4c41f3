pub mod item;
pub mod post;
pub mod report;

pub use item::{Item, Snapshot};
pub use post::Post;
pub use report::{clamp_take, rank_posts, RankedEntry, ReportOutcome, DEFAULT_TAKE};
