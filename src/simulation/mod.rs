pub mod fire;
pub mod game;
pub mod scheduler;
pub mod statistics;

pub use fire::{spread_fire, FireSpread};
pub use game::{ClickResult, Game, GameEvent, GameOverReason, GamePhase, TickOutcome};
pub use scheduler::{TickHandle, TickScheduler};
pub use statistics::{compute_statistics, TickStatistics};
