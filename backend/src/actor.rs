use game_core::{Command, Controller, GameError, NameCache};
use rand_chacha::ChaCha8Rng;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, trace};

use crate::timer::TokioRoundTimer;
use crate::view::{ServerMessage, SessionView};

pub(crate) type GameController<C> = Controller<C, TokioRoundTimer, ChaCha8Rng>;

/// One entry in the controller's queue. HTTP, WebSocket and the countdown all
/// feed the same queue, so transitions apply one at a time in arrival order.
#[derive(Debug)]
pub(crate) enum Input {
    Command {
        command: Command,
        reply: oneshot::Sender<Result<SessionView, GameError>>,
    },
    Tick {
        epoch: u64,
    },
}

pub(crate) struct Publisher {
    pub snapshot: watch::Sender<SessionView>,
    pub updates: broadcast::Sender<ServerMessage>,
}

pub(crate) async fn run<C: NameCache>(
    mut controller: GameController<C>,
    mut inbox: mpsc::Receiver<Input>,
    publisher: Publisher,
) {
    while let Some(input) = inbox.recv().await {
        match input {
            Input::Command { command, reply } => {
                let outcome = apply(&mut controller, command, &publisher);
                let _ = reply.send(outcome);
            }
            Input::Tick { epoch } => {
                if !controller.timer().accepts(epoch) {
                    trace!(epoch, "dropping stale timer tick");
                    continue;
                }
                let _ = apply(&mut controller, Command::TimerTick, &publisher);
            }
        }
    }
    debug!("controller queue closed");
}

fn apply<C: NameCache>(
    controller: &mut GameController<C>,
    command: Command,
    publisher: &Publisher,
) -> Result<SessionView, GameError> {
    let name = command.name();
    match controller.dispatch(command) {
        Ok(events) => {
            let view = SessionView::project(controller.session(), controller.catalog());
            debug!(command = name, phase = %view.phase, "command applied");

            publisher.snapshot.send_replace(view.clone());
            // No subscribers is fine; the renderer may not be connected yet.
            let _ = publisher.updates.send(ServerMessage::State(view.clone()));
            for event in events {
                let _ = publisher.updates.send(ServerMessage::Event(event));
            }
            Ok(view)
        }
        Err(error) => {
            debug!(command = name, %error, "command rejected");
            Err(error)
        }
    }
}
