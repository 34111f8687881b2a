use crate::catalog::WordCatalog;
use crate::ports::{usable_roster, NameCache, RoundTimer};
use crate::session::{Command, GameError, GameEvent, Session};
use rand::Rng;

/// Owns the session and its collaborators. Every intent goes through `dispatch`,
/// one at a time.
pub struct Controller<C, T, R> {
    session: Session,
    catalog: WordCatalog,
    cache: C,
    timer: T,
    rng: R,
}

impl<C, T, R> Controller<C, T, R>
where
    C: NameCache,
    T: RoundTimer,
    R: Rng,
{
    pub fn new(catalog: WordCatalog, cache: C, timer: T, rng: R) -> Self {
        let mut session = Session::default();
        if let Some(names) = usable_roster(cache.load()) {
            session.adopt_roster(names);
        }

        Self {
            session,
            catalog,
            cache,
            timer,
            rng,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn catalog(&self) -> &WordCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn dispatch(&mut self, command: Command) -> Result<Vec<GameEvent>, GameError> {
        let cached_names = match command {
            Command::StartGame => self.cache.load(),
            _ => None,
        };

        let events = self
            .session
            .apply(command, &self.catalog, cached_names, &mut self.rng)?;

        for event in &events {
            if let GameEvent::NamesCommitted { names } = event {
                self.cache.save(names);
            }
        }
        self.sync_timer();
        Ok(events)
    }

    /// Runs the countdown exactly while the session is in Playing.
    fn sync_timer(&mut self) {
        match (self.session.timer_active(), self.timer.is_running()) {
            (true, false) => self.timer.start(),
            (false, true) => self.timer.cancel(),
            _ => {}
        }
    }
}
