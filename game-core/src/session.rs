use crate::catalog::{CategorySelection, WordCatalog};
use crate::ports::usable_roster;
use crate::tally::{tally_votes, TallyEntry, Vote};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::mem;
use thiserror::Error;

pub const MIN_PLAYERS: usize = 3;
pub const MAX_PLAYERS: usize = 10;
pub const MIN_ROUND_SECS: u32 = 60;
pub const MAX_ROUND_SECS: u32 = 300;
pub const ROUND_STEP_SECS: u32 = 30;
pub const DEFAULT_ROUND_SECS: u32 = 180;
pub const MAX_NAME_CHARS: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub player_count: usize,
    pub round_duration_secs: u32,
    pub category: CategorySelection,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            player_count: MIN_PLAYERS,
            round_duration_secs: DEFAULT_ROUND_SECS,
            category: CategorySelection::Mixed,
        }
    }
}

/// The secret drawn at round start. Lives only inside the round phases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Round {
    pub secret_word: String,
    pub impostor_index: usize,
    pub category: CategorySelection,
}

impl Round {
    pub fn role_for(&self, player_index: usize) -> RevealedRole {
        if player_index == self.impostor_index {
            RevealedRole::Impostor
        } else {
            RevealedRole::Word {
                word: self.secret_word.clone(),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Setup,
    NamingPlayers,
    Reveal,
    Playing,
    Voting,
    Results,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhaseKind::Setup => "setup",
            PhaseKind::NamingPlayers => "naming_players",
            PhaseKind::Reveal => "reveal",
            PhaseKind::Playing => "playing",
            PhaseKind::Voting => "voting",
            PhaseKind::Results => "results",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum Phase {
    #[default]
    Setup,
    NamingPlayers,
    Reveal {
        round: Round,
        current_player: usize,
        word_revealed: bool,
    },
    Playing {
        round: Round,
        time_remaining_secs: u32,
    },
    Voting {
        round: Round,
        current_voter: usize,
        votes: Vec<Vote>,
    },
    Results {
        round: Round,
        votes: Vec<Vote>,
    },
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Setup => PhaseKind::Setup,
            Phase::NamingPlayers => PhaseKind::NamingPlayers,
            Phase::Reveal { .. } => PhaseKind::Reveal,
            Phase::Playing { .. } => PhaseKind::Playing,
            Phase::Voting { .. } => PhaseKind::Voting,
            Phase::Results { .. } => PhaseKind::Results,
        }
    }

    pub fn round(&self) -> Option<&Round> {
        match self {
            Phase::Setup | Phase::NamingPlayers => None,
            Phase::Reveal { round, .. }
            | Phase::Playing { round, .. }
            | Phase::Voting { round, .. }
            | Phase::Results { round, .. } => Some(round),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Command {
    SetPlayerCount { count: usize },
    SetRoundDuration { seconds: u32 },
    SelectCategory { category: CategorySelection },
    StartGame,
    ChangePlayers,
    SubmitNames { names: Vec<String> },
    RevealWord,
    AdvancePlayer,
    TimerTick,
    ForceVote,
    EndGameEarly,
    CastVote { voted_for: String },
    NewGame,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetPlayerCount { .. } => "set_player_count",
            Command::SetRoundDuration { .. } => "set_round_duration",
            Command::SelectCategory { .. } => "select_category",
            Command::StartGame => "start_game",
            Command::ChangePlayers => "change_players",
            Command::SubmitNames { .. } => "submit_names",
            Command::RevealWord => "reveal_word",
            Command::AdvancePlayer => "advance_player",
            Command::TimerTick => "timer_tick",
            Command::ForceVote => "force_vote",
            Command::EndGameEarly => "end_game_early",
            Command::CastVote { .. } => "cast_vote",
            Command::NewGame => "new_game",
        }
    }
}

/// What an accepted command did. Never carries the secret word or the impostor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum GameEvent {
    PlayerCountChanged { count: usize, names_cleared: bool },
    RoundDurationChanged { seconds: u32 },
    CategorySelected { category: CategorySelection },
    NamingStarted { slots: usize },
    NamesCommitted { names: Vec<String> },
    RoundStarted { category: CategorySelection, player_count: usize },
    WordRevealed { player_index: usize },
    PlayerAdvanced { player_index: usize },
    TimerStarted { seconds: u32 },
    TimerTicked { remaining_secs: u32 },
    VotingStarted { timer_expired: bool },
    VoteCast { voter: String, voted_for: String },
    ResultsReady,
    SessionReset,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("player count {0} is outside 3..=10")]
    PlayerCountOutOfRange(usize),
    #[error("round duration {0}s must be 60..=300 in 30 second steps")]
    RoundDurationOutOfRange(u32),
    #[error("unknown category {0:?}")]
    UnknownCategory(String),
    #[error("expected {expected} names, got {actual}")]
    NameCountMismatch { expected: usize, actual: usize },
    #[error("name for player {} is empty", .index + 1)]
    EmptyName { index: usize },
    #[error("name for player {} is longer than 20 characters", .index + 1)]
    NameTooLong { index: usize },
    #[error("name {0:?} is used twice")]
    DuplicateName(String),
    #[error("{0} cannot vote for themselves")]
    SelfVote(String),
    #[error("{0:?} is not a player")]
    UnknownCandidate(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("{command} is not allowed during {phase}")]
    IllegalTransition {
        phase: PhaseKind,
        command: &'static str,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no words available for category {0}")]
    NoWordsAvailable(CategorySelection),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "role")]
pub enum RevealedRole {
    Word { word: String },
    Impostor,
}

/// Pass-the-device card for whoever holds the device during Reveal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevealCard {
    pub player_index: usize,
    pub player_name: String,
    pub is_last_player: bool,
    /// `None` until the player taps reveal.
    pub role: Option<RevealedRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ballot {
    pub voter_index: usize,
    pub voter: String,
    pub candidates: Vec<String>,
    pub vote_number: usize,
    pub total_votes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundResults {
    pub secret_word: String,
    pub category_name: String,
    pub impostor_name: String,
    pub tally: Vec<TallyEntry>,
}

/// The one live game aggregate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub settings: Settings,
    pub player_names: Vec<String>,
    pub phase: Phase,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            player_names: Vec::new(),
            phase: Phase::Setup,
        }
    }

    /// Takes over a remembered roster; the player count follows its length.
    pub fn adopt_roster(&mut self, names: Vec<String>) {
        self.settings.player_count = names.len();
        self.player_names = names;
    }

    pub fn phase_kind(&self) -> PhaseKind {
        self.phase.kind()
    }

    pub fn timer_active(&self) -> bool {
        matches!(self.phase, Phase::Playing { .. })
    }

    pub fn time_remaining_secs(&self) -> Option<u32> {
        match self.phase {
            Phase::Playing {
                time_remaining_secs,
                ..
            } => Some(time_remaining_secs),
            _ => None,
        }
    }

    pub fn votes(&self) -> &[Vote] {
        match &self.phase {
            Phase::Voting { votes, .. } | Phase::Results { votes, .. } => votes,
            _ => &[],
        }
    }

    /// True when "Start Game" can skip name entry using the names already held.
    pub fn saved_roster_ready(&self) -> bool {
        self.player_names.len() == self.settings.player_count
            && self.player_names.iter().all(|n| !n.trim().is_empty())
    }

    pub fn reveal_card(&self) -> Option<RevealCard> {
        let Phase::Reveal {
            round,
            current_player,
            word_revealed,
        } = &self.phase
        else {
            return None;
        };
        Some(RevealCard {
            player_index: *current_player,
            player_name: self.player_names.get(*current_player)?.clone(),
            is_last_player: *current_player + 1 >= self.settings.player_count,
            role: word_revealed.then(|| round.role_for(*current_player)),
        })
    }

    pub fn ballot(&self) -> Option<Ballot> {
        let Phase::Voting { current_voter, .. } = &self.phase else {
            return None;
        };
        let voter = self.player_names.get(*current_voter)?.clone();
        Some(Ballot {
            voter_index: *current_voter,
            candidates: self
                .player_names
                .iter()
                .filter(|n| **n != voter)
                .cloned()
                .collect(),
            voter,
            vote_number: *current_voter + 1,
            total_votes: self.settings.player_count,
        })
    }

    pub fn results(&self, catalog: &WordCatalog) -> Option<RoundResults> {
        let Phase::Results { round, votes } = &self.phase else {
            return None;
        };
        Some(RoundResults {
            secret_word: round.secret_word.clone(),
            category_name: catalog.display_name(&round.category),
            impostor_name: self.player_names.get(round.impostor_index)?.clone(),
            tally: tally_votes(&self.player_names, votes),
        })
    }

    /// Applies one command. A rejected command leaves the session untouched.
    pub fn apply<R: Rng + ?Sized>(
        &mut self,
        command: Command,
        catalog: &WordCatalog,
        cached_names: Option<Vec<String>>,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        let illegal = GameError::IllegalTransition {
            phase: self.phase.kind(),
            command: command.name(),
        };
        let in_setup = matches!(self.phase, Phase::Setup);

        match command {
            Command::SetPlayerCount { count } if in_setup => self.set_player_count(count),
            Command::SetRoundDuration { seconds } if in_setup => {
                self.set_round_duration(seconds)
            }
            Command::SelectCategory { category } if in_setup => {
                self.select_category(category, catalog)
            }
            Command::StartGame if in_setup => self.start_game(catalog, cached_names, rng),
            Command::ChangePlayers if in_setup => Ok(self.begin_naming()),
            Command::SubmitNames { names } if matches!(self.phase, Phase::NamingPlayers) => {
                self.submit_names(names, catalog, rng)
            }
            Command::RevealWord => self.reveal_word().ok_or(illegal),
            Command::AdvancePlayer => self.advance_player().ok_or(illegal),
            Command::TimerTick => self.timer_tick().ok_or(illegal),
            Command::ForceVote => self.force_vote().ok_or(illegal),
            Command::EndGameEarly => self.end_game_early().ok_or(illegal),
            Command::CastVote { voted_for } => self.cast_vote(voted_for).unwrap_or(Err(illegal)),
            Command::NewGame => self.new_game().ok_or(illegal),
            _ => Err(illegal),
        }
    }

    fn set_player_count(&mut self, count: usize) -> Result<Vec<GameEvent>, GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
            return Err(ValidationError::PlayerCountOutOfRange(count).into());
        }
        let names_cleared = !self.player_names.is_empty() && self.player_names.len() != count;
        if names_cleared {
            self.player_names.clear();
        }
        self.settings.player_count = count;
        Ok(vec![GameEvent::PlayerCountChanged {
            count,
            names_cleared,
        }])
    }

    fn set_round_duration(&mut self, seconds: u32) -> Result<Vec<GameEvent>, GameError> {
        let in_range = (MIN_ROUND_SECS..=MAX_ROUND_SECS).contains(&seconds);
        if !in_range || (seconds - MIN_ROUND_SECS) % ROUND_STEP_SECS != 0 {
            return Err(ValidationError::RoundDurationOutOfRange(seconds).into());
        }
        self.settings.round_duration_secs = seconds;
        Ok(vec![GameEvent::RoundDurationChanged { seconds }])
    }

    fn select_category(
        &mut self,
        category: CategorySelection,
        catalog: &WordCatalog,
    ) -> Result<Vec<GameEvent>, GameError> {
        if !catalog.contains(&category) {
            return Err(ValidationError::UnknownCategory(category.to_string()).into());
        }
        self.settings.category = category.clone();
        Ok(vec![GameEvent::CategorySelected { category }])
    }

    fn start_game<R: Rng + ?Sized>(
        &mut self,
        catalog: &WordCatalog,
        cached_names: Option<Vec<String>>,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        let count = self.settings.player_count;
        let fits = |names: &Vec<String>| names.len() == count;
        let roster = usable_roster(cached_names)
            .filter(fits)
            .or_else(|| usable_roster(Some(self.player_names.clone())).filter(fits));

        match roster {
            Some(names) => self.start_round(names, catalog, rng),
            None => Ok(self.begin_naming()),
        }
    }

    fn begin_naming(&mut self) -> Vec<GameEvent> {
        let slots = self.settings.player_count;
        self.player_names = vec![String::new(); slots];
        self.phase = Phase::NamingPlayers;
        vec![GameEvent::NamingStarted { slots }]
    }

    fn submit_names<R: Rng + ?Sized>(
        &mut self,
        names: Vec<String>,
        catalog: &WordCatalog,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        let names = validate_names(names, self.settings.player_count)?;
        self.start_round(names, catalog, rng)
    }

    /// Round-start: word draw, then an independent impostor draw. Nothing is
    /// committed unless both succeed.
    fn start_round<R: Rng + ?Sized>(
        &mut self,
        names: Vec<String>,
        catalog: &WordCatalog,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        let category = self.settings.category.clone();
        let round = draw_round(catalog, &category, names.len(), rng)?;

        self.player_names = names.clone();
        self.phase = Phase::Reveal {
            round,
            current_player: 0,
            word_revealed: false,
        };
        Ok(vec![
            GameEvent::NamesCommitted { names },
            GameEvent::RoundStarted {
                category,
                player_count: self.settings.player_count,
            },
        ])
    }

    fn reveal_word(&mut self) -> Option<Vec<GameEvent>> {
        let Phase::Reveal {
            current_player,
            word_revealed,
            ..
        } = &mut self.phase
        else {
            return None;
        };
        *word_revealed = true;
        Some(vec![GameEvent::WordRevealed {
            player_index: *current_player,
        }])
    }

    fn advance_player(&mut self) -> Option<Vec<GameEvent>> {
        let last_player = self.settings.player_count.saturating_sub(1);
        let Phase::Reveal {
            current_player,
            word_revealed,
            ..
        } = &mut self.phase
        else {
            return None;
        };

        if *current_player < last_player {
            *current_player += 1;
            *word_revealed = false;
            return Some(vec![GameEvent::PlayerAdvanced {
                player_index: *current_player,
            }]);
        }

        let round = self.take_round()?;
        let seconds = self.settings.round_duration_secs;
        self.phase = Phase::Playing {
            round,
            time_remaining_secs: seconds,
        };
        Some(vec![GameEvent::TimerStarted { seconds }])
    }

    fn timer_tick(&mut self) -> Option<Vec<GameEvent>> {
        let Phase::Playing {
            time_remaining_secs,
            ..
        } = &mut self.phase
        else {
            return None;
        };

        if *time_remaining_secs > 0 {
            *time_remaining_secs -= 1;
            return Some(vec![GameEvent::TimerTicked {
                remaining_secs: *time_remaining_secs,
            }]);
        }
        self.begin_voting(true)
    }

    fn force_vote(&mut self) -> Option<Vec<GameEvent>> {
        if !self.timer_active() {
            return None;
        }
        self.begin_voting(false)
    }

    fn begin_voting(&mut self, timer_expired: bool) -> Option<Vec<GameEvent>> {
        let round = self.take_round()?;
        self.phase = Phase::Voting {
            round,
            current_voter: 0,
            votes: Vec::new(),
        };
        Some(vec![GameEvent::VotingStarted { timer_expired }])
    }

    fn end_game_early(&mut self) -> Option<Vec<GameEvent>> {
        if !self.timer_active() {
            return None;
        }
        self.phase = Phase::Setup;
        Some(vec![GameEvent::SessionReset])
    }

    /// `None` when not voting; `Some(Err)` when the ballot itself is refused.
    fn cast_vote(&mut self, voted_for: String) -> Option<Result<Vec<GameEvent>, GameError>> {
        let player_count = self.settings.player_count;
        let Phase::Voting {
            current_voter,
            votes,
            ..
        } = &mut self.phase
        else {
            return None;
        };
        let voter = self.player_names.get(*current_voter)?.clone();

        if !self.player_names.contains(&voted_for) {
            return Some(Err(ValidationError::UnknownCandidate(voted_for).into()));
        }
        if voted_for == voter {
            return Some(Err(ValidationError::SelfVote(voter).into()));
        }

        votes.push(Vote::new(voter.clone(), voted_for.clone()));
        let mut events = vec![GameEvent::VoteCast { voter, voted_for }];

        if *current_voter + 1 < player_count {
            *current_voter += 1;
        } else {
            let votes = mem::take(votes);
            let round = self.take_round()?;
            self.phase = Phase::Results { round, votes };
            events.push(GameEvent::ResultsReady);
        }
        Some(Ok(events))
    }

    fn new_game(&mut self) -> Option<Vec<GameEvent>> {
        if !matches!(self.phase, Phase::Results { .. }) {
            return None;
        }
        self.phase = Phase::Setup;
        Some(vec![GameEvent::SessionReset])
    }

    /// Moves the round out of the current phase, leaving Setup behind. Callers
    /// overwrite the phase right after.
    fn take_round(&mut self) -> Option<Round> {
        match mem::take(&mut self.phase) {
            Phase::Reveal { round, .. }
            | Phase::Playing { round, .. }
            | Phase::Voting { round, .. }
            | Phase::Results { round, .. } => Some(round),
            other => {
                self.phase = other;
                None
            }
        }
    }
}

pub(crate) fn validate_names(
    names: Vec<String>,
    expected: usize,
) -> Result<Vec<String>, ValidationError> {
    if names.len() != expected {
        return Err(ValidationError::NameCountMismatch {
            expected,
            actual: names.len(),
        });
    }

    let mut trimmed: Vec<String> = Vec::with_capacity(names.len());
    for (index, name) in names.iter().enumerate() {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName { index });
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(ValidationError::NameTooLong { index });
        }
        if trimmed.iter().any(|existing| existing == name) {
            return Err(ValidationError::DuplicateName(name.to_string()));
        }
        trimmed.push(name.to_string());
    }
    Ok(trimmed)
}

fn draw_round<R: Rng + ?Sized>(
    catalog: &WordCatalog,
    category: &CategorySelection,
    player_count: usize,
    rng: &mut R,
) -> Result<Round, GameError> {
    let pool = catalog.candidate_pool(category);
    let word = pool
        .choose(rng)
        .ok_or_else(|| GameError::NoWordsAvailable(category.clone()))?;
    let impostor_index = rng.gen_range(0..player_count);

    Ok(Round {
        secret_word: word.to_string(),
        impostor_index,
        category: category.clone(),
    })
}
