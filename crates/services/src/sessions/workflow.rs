use quiz_core::countdown::TICK_INTERVAL;
use quiz_core::model::Markup;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::progress::QuizSnapshot;
use super::service::{QuizSessionService, Submission};
use crate::error::SessionError;
use crate::route::Route;

const EVENT_QUEUE_DEPTH: usize = 32;

/// Inputs to the session loop. Ticks come from the countdown task, everything
/// else from the taker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Tick,
    SelectAnswer(Markup),
    GoTo(usize),
    Next,
    Previous,
    Submit,
}

/// Which producer triggered the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Manual,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The loop completed the session.
    Submitted(SubmitTrigger),
    /// The session was already complete when the loop started.
    AlreadyCompleted,
    /// Every event producer went away before submission.
    Disconnected,
}

impl LoopExit {
    #[must_use]
    pub fn route(self) -> Route {
        match self {
            LoopExit::Submitted(_) | LoopExit::AlreadyCompleted => Route::Results,
            LoopExit::Disconnected => Route::Quiz,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub exit: LoopExit,
    pub snapshot: QuizSnapshot,
}

/// Taker-side handle: send commands, watch snapshots.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    events: mpsc::Sender<SessionEvent>,
    snapshots: watch::Receiver<QuizSnapshot>,
}

impl SessionHandle {
    /// Queue an event for the loop. Returns false once the loop has stopped.
    pub async fn send(&self, event: SessionEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    #[must_use]
    pub fn snapshot(&self) -> QuizSnapshot {
        self.snapshots.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<QuizSnapshot> {
        self.snapshots.clone()
    }
}

/// Single consumer for the quiz session.
///
/// Countdown ticks and taker commands arrive on one queue and are applied one
/// at a time, so no two mutations ever interleave. The countdown is observed
/// after every event; the first time it reads zero the session is submitted
/// and the ticker is stopped.
pub struct SessionLoop {
    service: QuizSessionService,
    events: mpsc::Receiver<SessionEvent>,
    ticks: mpsc::WeakSender<SessionEvent>,
    snapshots: watch::Sender<QuizSnapshot>,
}

impl SessionLoop {
    #[must_use]
    pub fn new(service: QuizSessionService) -> (Self, SessionHandle) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let (snapshots_tx, snapshots_rx) = watch::channel(service.snapshot());
        let ticks = events_tx.downgrade();
        let handle = SessionHandle {
            events: events_tx,
            snapshots: snapshots_rx,
        };
        let session_loop = Self {
            service,
            events: events_rx,
            ticks,
            snapshots: snapshots_tx,
        };
        (session_loop, handle)
    }

    /// Drive the session until it is submitted.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if a mutation cannot be persisted. A
    /// rejected navigation is logged and the loop carries on.
    pub async fn run(mut self) -> Result<LoopOutcome, SessionError> {
        if self.service.is_complete() {
            return Ok(self.finish(LoopExit::AlreadyCompleted));
        }

        // Already out of time on entry (e.g. reload long after the deadline).
        if self.service.observe_countdown().is_expired {
            self.submit(SubmitTrigger::Timeout).await?;
            return Ok(self.finish(LoopExit::Submitted(SubmitTrigger::Timeout)));
        }

        // The ticker only holds a weak sender, so dropping every taker handle
        // closes the queue.
        let ticker = spawn_ticker(self.ticks.clone());
        let result = self.consume().await;
        ticker.abort();

        let exit = result?;
        Ok(self.finish(exit))
    }

    async fn consume(&mut self) -> Result<LoopExit, SessionError> {
        while let Some(event) = self.events.recv().await {
            let manual_submit = match event {
                SessionEvent::Tick => {
                    tracing::trace!("tick");
                    false
                }
                SessionEvent::SelectAnswer(answer) => {
                    absorb(self.service.select_answer(answer).await)?;
                    false
                }
                SessionEvent::GoTo(index) => {
                    absorb(self.service.go_to(index).await)?;
                    false
                }
                SessionEvent::Next => {
                    absorb(self.service.next().await)?;
                    false
                }
                SessionEvent::Previous => {
                    absorb(self.service.previous().await)?;
                    false
                }
                SessionEvent::Submit => true,
            };

            if manual_submit {
                self.submit(SubmitTrigger::Manual).await?;
                return Ok(LoopExit::Submitted(SubmitTrigger::Manual));
            }

            let tick = self.service.observe_countdown();
            if tick.is_expired {
                self.submit(SubmitTrigger::Timeout).await?;
                return Ok(LoopExit::Submitted(SubmitTrigger::Timeout));
            }

            self.publish();
        }

        Ok(LoopExit::Disconnected)
    }

    async fn submit(&mut self, trigger: SubmitTrigger) -> Result<(), SessionError> {
        match self.service.submit().await? {
            Submission::Accepted => tracing::info!(?trigger, "quiz submitted"),
            Submission::AlreadyCompleted => tracing::debug!(?trigger, "submission absorbed"),
        }
        Ok(())
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.service.snapshot());
    }

    fn finish(self, exit: LoopExit) -> LoopOutcome {
        self.publish();
        LoopOutcome {
            exit,
            snapshot: self.service.snapshot(),
        }
    }
}

/// Log and swallow a rejected navigation; propagate everything else.
fn absorb(result: Result<(), SessionError>) -> Result<(), SessionError> {
    match result {
        Err(SessionError::InvalidNavigationIndex { index, len }) => {
            tracing::warn!(index, len, "navigation rejected");
            Ok(())
        }
        other => other,
    }
}

fn spawn_ticker(events: mpsc::WeakSender<SessionEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let Some(events) = events.upgrade() else {
                break;
            };
            if events.send(SessionEvent::Tick).await.is_err() {
                break;
            }
        }
    })
}
