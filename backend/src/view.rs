use game_core::{
    Ballot, GameEvent, PhaseKind, RevealCard, RoundResults, Session, Settings, WordCatalog,
};
use serde::{Deserialize, Serialize};

/// Everything a renderer needs to draw the current screen. Secrets appear only
/// where the game shows them: the word on a revealed card and on the results.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionView {
    pub phase: PhaseKind,
    pub settings: Settings,
    pub player_names: Vec<String>,
    pub saved_roster_ready: bool,
    pub timer_active: bool,
    pub detail: Option<PhaseDetail>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhaseDetail {
    Setup,
    NamingPlayers {
        slots: usize,
    },
    Reveal {
        card: RevealCard,
    },
    Playing {
        time_remaining_secs: u32,
        clock: String,
    },
    Voting {
        ballot: Ballot,
    },
    Results {
        results: RoundResults,
    },
}

impl SessionView {
    pub fn project(session: &Session, catalog: &WordCatalog) -> Self {
        Self {
            phase: session.phase_kind(),
            settings: session.settings.clone(),
            player_names: session.player_names.clone(),
            saved_roster_ready: session.saved_roster_ready(),
            timer_active: session.timer_active(),
            detail: phase_detail(session, catalog),
        }
    }
}

fn phase_detail(session: &Session, catalog: &WordCatalog) -> Option<PhaseDetail> {
    match session.phase_kind() {
        PhaseKind::Setup => Some(PhaseDetail::Setup),
        PhaseKind::NamingPlayers => Some(PhaseDetail::NamingPlayers {
            slots: session.settings.player_count,
        }),
        PhaseKind::Reveal => session.reveal_card().map(|card| PhaseDetail::Reveal { card }),
        PhaseKind::Playing => session.time_remaining_secs().map(|secs| PhaseDetail::Playing {
            time_remaining_secs: secs,
            clock: format_clock(secs),
        }),
        PhaseKind::Voting => session.ballot().map(|ballot| PhaseDetail::Voting { ballot }),
        PhaseKind::Results => session
            .results(catalog)
            .map(|results| PhaseDetail::Results { results }),
    }
}

/// `m:ss`, the way the countdown is displayed.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    State(SessionView),
    Event(GameEvent),
    Error(ApiError),
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    IllegalTransition,
    Validation,
    Configuration,
    Unavailable,
    BadRequest,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
