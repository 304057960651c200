//! Domain services - business rules layered over the ports.

mod engagement;
mod posts;

pub use engagement::{EngagementLedger, LikeOutcome};
pub use posts::PostService;
