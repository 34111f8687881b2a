//! Game rules for a pass-the-device impostor party game: who gets the secret
//! word, how a round moves from reveal through discussion to voting, and how the
//! votes are counted.

pub mod catalog;
pub mod controller;
pub mod ports;
pub mod session;
pub mod tally;

pub use catalog::{Category, CategoryDescriptor, CategorySelection, WordCatalog, MIXED_KEY};
pub use controller::Controller;
pub use ports::{ManualTimer, MemoryNameCache, NameCache, RoundTimer};
pub use session::{
    Ballot, Command, GameError, GameEvent, Phase, PhaseKind, RevealCard, RevealedRole, Round,
    RoundResults, Session, Settings, ValidationError, DEFAULT_ROUND_SECS, MAX_NAME_CHARS,
    MAX_PLAYERS, MAX_ROUND_SECS, MIN_PLAYERS, MIN_ROUND_SECS, ROUND_STEP_SECS,
};
pub use tally::{tally_votes, TallyEntry, Vote};
