//! Mission play, timers and progress persistence

pub mod identity;
pub mod leaderboard;
pub mod mission;
pub mod registry;
pub mod store;
pub mod timer;

#[cfg(test)]
mod mission_test;

pub use identity::{Identity, PgIdentity, SessionEvent, SessionWatch};
pub use mission::{MissionRunner, MissionState, Player, Step};
pub use registry::{MissionRegistry, MissionTicker, TickerConfig};
pub use store::{MemoryProgressStore, PgProgressStore, ProgressStore};
pub use timer::QuestionTimer;
