//! Form actor
//!
//! One task owns one [`FormInstance`] and handles its messages one at a
//! time, so an input always finishes (answer write and visibility pass)
//! before the next one starts.

use crate::error::{FormError, FormResult};
use crate::events::FormEvent;
use crate::input::FieldInput;
use crate::instance::FormInstance;
use crate::submission::Submission;
use agriforms_schema::{AnswerMap, VisibilitySet};
use tokio::sync::{mpsc, oneshot};

const MAILBOX_CAPACITY: usize = 32;

enum Command {
    Input {
        input: FieldInput,
        reply: oneshot::Sender<FormResult<Vec<(String, bool)>>>,
    },
    Answers {
        reply: oneshot::Sender<AnswerMap>,
    },
    Visibility {
        reply: oneshot::Sender<VisibilitySet>,
    },
    Submit {
        reply: oneshot::Sender<FormResult<Submission>>,
    },
    TakeEvents {
        reply: oneshot::Sender<Vec<FormEvent>>,
    },
}

/// Task owning a form instance
pub struct FormActor {
    instance: FormInstance,
    rx: mpsc::Receiver<Command>,
}

impl FormActor {
    /// Move `instance` into a new task and return its handle.
    ///
    /// Must be called from within a Tokio runtime. The task ends when every
    /// handle is dropped.
    pub fn spawn(instance: FormInstance) -> FormHandle {
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        let actor = Self { instance, rx };
        tokio::spawn(actor.run());
        FormHandle { tx }
    }

    async fn run(mut self) {
        let form = self.instance.schema().key.clone();
        tracing::debug!(form = %form, instance = %self.instance.id(), "form actor started");
        while let Some(command) = self.rx.recv().await {
            self.handle(command);
        }
        tracing::debug!(form = %form, "form actor stopped");
    }

    fn handle(&mut self, command: Command) {
        // a dropped receiver only means the caller stopped waiting
        match command {
            Command::Input { input, reply } => {
                let _ = reply.send(self.instance.apply(input));
            }
            Command::Answers { reply } => {
                let _ = reply.send(self.instance.current_answers().clone());
            }
            Command::Visibility { reply } => {
                let _ = reply.send(self.instance.visibility().clone());
            }
            Command::Submit { reply } => {
                let _ = reply.send(self.instance.submit());
            }
            Command::TakeEvents { reply } => {
                let _ = reply.send(self.instance.take_events());
            }
        }
    }
}

/// Cloneable handle to a [`FormActor`]
#[derive(Clone)]
pub struct FormHandle {
    tx: mpsc::Sender<Command>,
}

impl FormHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> FormResult<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| FormError::ActorClosed)?;
        rx.await.map_err(|_| FormError::ActorClosed)
    }

    /// Apply an input; returns the visibility changes
    pub async fn input(&self, input: FieldInput) -> FormResult<Vec<(String, bool)>> {
        self.request(|reply| Command::Input { input, reply }).await?
    }

    /// Snapshot of the answer map
    pub async fn current_answers(&self) -> FormResult<AnswerMap> {
        self.request(|reply| Command::Answers { reply }).await
    }

    /// Current visibility of every field
    pub async fn visibility(&self) -> FormResult<VisibilitySet> {
        self.request(|reply| Command::Visibility { reply }).await
    }

    /// Validate and collect the visible answers
    pub async fn submit(&self) -> FormResult<Submission> {
        self.request(|reply| Command::Submit { reply }).await?
    }

    /// Drain recorded events
    pub async fn take_events(&self) -> FormResult<Vec<FormEvent>> {
        self.request(|reply| Command::TakeEvents { reply }).await
    }
}
