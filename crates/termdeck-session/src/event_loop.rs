//! The task that owns the controller.
//!
//! User input arrives through a [`LoopHandle`]; host events arrive on the
//! host's event channel, sent from per-session reader threads. Both are
//! merged here so every controller mutation runs on one task.

use tokio::sync::mpsc;
use tracing::{debug, info};

use termdeck_core::{Command, Error, KeyChord, Result};
use termdeck_host::{EventReceiver, HostEvent};

use crate::controller::{Flow, SessionController};

/// Input from the UI side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A user command
    Command(Command),
    /// A key press, resolved against the shortcut table
    Key(KeyChord),
    /// The UI came on screen (`true`) or went away (`false`)
    Visibility(bool),
    /// Stop the loop
    Shutdown,
}

/// Cloneable sender for [`Input`].
#[derive(Debug, Clone)]
pub struct LoopHandle {
    tx: mpsc::UnboundedSender<Input>,
}

impl LoopHandle {
    /// Queue an input.
    pub fn send(&self, input: Input) -> Result<()> {
        self.tx
            .send(input)
            .map_err(|_| Error::Other("controller loop has stopped".to_string()))
    }

    /// Queue a command.
    pub fn command(&self, command: Command) -> Result<()> {
        self.send(Input::Command(command))
    }

    /// Queue a key press.
    pub fn key(&self, chord: KeyChord) -> Result<()> {
        self.send(Input::Key(chord))
    }

    /// Report a visibility change.
    pub fn set_visible(&self, visible: bool) -> Result<()> {
        self.send(Input::Visibility(visible))
    }

    /// Ask the loop to stop.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Input::Shutdown)
    }
}

enum Wake {
    Input(Option<Input>),
    Event(Option<HostEvent>),
}

/// Owns a [`SessionController`] and feeds it inputs and host events.
pub struct ControllerLoop {
    controller: SessionController,
    inputs: mpsc::UnboundedReceiver<Input>,
    events: EventReceiver,
}

impl ControllerLoop {
    /// Wrap a controller. `events` must be the receiver paired with the
    /// sender given to the controller's host.
    pub fn new(controller: SessionController, events: EventReceiver) -> (Self, LoopHandle) {
        let (tx, inputs) = mpsc::unbounded_channel();
        (
            Self {
                controller,
                inputs,
                events,
            },
            LoopHandle { tx },
        )
    }

    /// Connect the controller and process inputs and events until told to
    /// finish. Hands the disconnected controller back.
    pub async fn run(mut self) -> SessionController {
        info!("Controller loop starting");
        let mut flow = self.controller.connect();
        let mut events_open = true;

        while flow == Flow::Continue {
            let wake = tokio::select! {
                input = self.inputs.recv() => Wake::Input(input),
                event = self.events.recv(), if events_open => Wake::Event(event),
            };

            flow = match wake {
                Wake::Input(None) => {
                    info!("All loop handles dropped");
                    break;
                }
                Wake::Input(Some(Input::Shutdown)) => {
                    info!("Shutdown requested");
                    break;
                }
                Wake::Input(Some(input)) => self.apply(input),
                Wake::Event(Some(event)) => self.controller.handle_event(event),
                Wake::Event(None) => {
                    debug!("Host event channel closed");
                    events_open = false;
                    Flow::Continue
                }
            };
        }

        self.controller.disconnect();
        info!("Controller loop stopped");
        self.controller
    }

    fn apply(&mut self, input: Input) -> Flow {
        match input {
            Input::Command(command) => self.controller.dispatch(command),
            Input::Key(chord) => self.controller.handle_key(&chord),
            Input::Visibility(true) => {
                self.controller.became_visible();
                Flow::Continue
            }
            Input::Visibility(false) => {
                self.controller.became_hidden();
                Flow::Continue
            }
            Input::Shutdown => Flow::Finish,
        }
    }
}
