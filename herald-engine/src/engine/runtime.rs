//! Reporter event loop - serialises status events and re-check timers onto one task
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use opentelemetry::KeyValue;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace};

use herald_config::ReporterConfig;
use herald_core::{Clock, StatusEvent, StatusKind, StatusReporter, Surface, Transition};
use herald_telemetry::{EventLogger, MetricsRecorder};

use crate::engine::error::EngineError;

/// Builds a reporter with the configured timings and class prefix.
pub fn reporter_from_config<S: Surface, C: Clock>(
    config: &ReporterConfig,
    surface: S,
    clock: C,
) -> StatusReporter<S, C> {
    StatusReporter::new(surface, clock)
        .with_timing(config.timing())
        .with_class_prefix(config.class_prefix.clone())
}

enum Message {
    Event(StatusEvent),
    /// A re-check timer fired. Carries the timer's sender so a chain of
    /// re-checks keeps the channel open after the last handle is dropped.
    Recheck(UnboundedSender<Message>),
    Shutdown,
}

/// Counters returned when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Caller events handled (re-checks excluded).
    pub events: u64,
    /// Re-checks that fired.
    pub rechecks: u64,
    /// Kind left on screen at shutdown.
    pub final_kind: StatusKind,
}

/// Cloneable entry point into a running reporter.
#[derive(Clone)]
pub struct ReporterHandle {
    tx: UnboundedSender<Message>,
}

impl ReporterHandle {
    pub fn report_failure(&self, error: impl fmt::Display) -> Result<(), EngineError> {
        self.send(StatusEvent::failure(error))
    }

    pub fn report_delay(&self, error: impl fmt::Display) -> Result<(), EngineError> {
        self.send(StatusEvent::delay(error))
    }

    pub fn report_success(&self) -> Result<(), EngineError> {
        self.send(StatusEvent::Success)
    }

    pub fn send(&self, event: StatusEvent) -> Result<(), EngineError> {
        self.tx
            .send(Message::Event(event))
            .map_err(|_| EngineError::ChannelClosed)
    }

    /// Asks the loop to stop once everything queued before this call is handled.
    pub fn shutdown(&self) -> Result<(), EngineError> {
        self.tx
            .send(Message::Shutdown)
            .map_err(|_| EngineError::ChannelClosed)
    }

    /// Shuts the loop down and waits for its final counters.
    pub async fn close(self, task: JoinHandle<RuntimeStats>) -> Result<RuntimeStats, EngineError> {
        self.shutdown()?;
        Ok(task.await?)
    }
}

/// Owns a [`StatusReporter`] on a dedicated task.
pub struct ReporterRuntime<S: Surface, C: Clock> {
    reporter: StatusReporter<S, C>,
    metrics: Arc<MetricsRecorder>,
    rx: UnboundedReceiver<Message>,
    // Re-check timers post through this; weak so that it alone does not keep
    // the loop alive once every handle is gone.
    loopback: WeakUnboundedSender<Message>,
    stats: RuntimeStats,
}

impl<S, C> ReporterRuntime<S, C>
where
    S: Surface + Send + 'static,
    S::Handle: Send,
    C: Clock + Send + 'static,
{
    /// Moves the reporter onto a new task and returns a handle to it.
    ///
    /// The task ends after [`ReporterHandle::shutdown`], or once every handle
    /// has been dropped and no re-check is pending.
    pub fn spawn(
        reporter: StatusReporter<S, C>,
        metrics: Arc<MetricsRecorder>,
    ) -> (ReporterHandle, JoinHandle<RuntimeStats>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let runtime = Self {
            reporter,
            metrics,
            rx,
            loopback: tx.downgrade(),
            stats: RuntimeStats::default(),
        };
        let task = tokio::spawn(runtime.run());
        (ReporterHandle { tx }, task)
    }

    #[instrument(skip_all, name = "reporter_loop")]
    async fn run(mut self) -> RuntimeStats {
        info!(timing = ?self.reporter.timing(), "Reporter loop started");

        while let Some(message) = self.rx.recv().await {
            match message {
                Message::Event(event) => self.handle(event, None),
                Message::Recheck(sender) => self.handle(StatusEvent::Recheck, Some(sender)),
                Message::Shutdown => break,
            }
        }

        self.stats.final_kind = self.reporter.kind();
        info!(
            events = self.stats.events,
            rechecks = self.stats.rechecks,
            final_kind = %self.stats.final_kind,
            "Reporter loop stopped"
        );
        self.stats
    }

    fn handle(&mut self, event: StatusEvent, timer_sender: Option<UnboundedSender<Message>>) {
        if event == StatusEvent::Recheck {
            self.stats.rechecks += 1;
        } else {
            self.stats.events += 1;
        }
        trace!(?event, "Handling status event");

        let transition = self.reporter.apply(event);
        self.record(&transition);

        if let Some(after) = transition.retry_after() {
            self.schedule_recheck(after, timer_sender);
        }
    }

    fn schedule_recheck(&self, after: Duration, sender: Option<UnboundedSender<Message>>) {
        let Some(loopback) = sender.or_else(|| self.loopback.upgrade()) else {
            debug!("No handles left, dropping re-check");
            return;
        };
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            // The loop may have stopped in the meantime; nothing to re-check then.
            let _ = loopback.clone().send(Message::Recheck(loopback));
        });
    }

    fn record(&self, transition: &Transition) {
        match transition {
            Transition::Shown { kind, replaced } => {
                self.metrics.inc_shown(kind.as_str());
                EventLogger::log_event(
                    "banner_shown",
                    &[
                        KeyValue::new("kind", kind.as_str()),
                        KeyValue::new("replaced", replaced.as_str()),
                    ],
                );
            }
            Transition::Cleared { previous } => {
                self.metrics.inc_cleared();
                EventLogger::log_event(
                    "banner_cleared",
                    &[KeyValue::new("previous", previous.as_str())],
                );
            }
            Transition::Suppressed => self.metrics.inc_suppressed(),
            Transition::Deferred { after } => {
                self.metrics.inc_deferred();
                debug!(after_ms = after.as_millis() as u64, "Clear deferred");
            }
            Transition::Idle => trace!("Nothing to clear"),
        }
    }
}
