//! Streaming callback contract and the per-call state machine.

use tracing::warn;

/// One callback event from a streaming dispatch call.
///
/// Per call: `Data` may repeat; `Finish` and `Error` each occur at most
/// once and are mutually exclusive terminal signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A payload arrived.
    Data(String),
    /// The stream completed normally. No callback follows.
    Finish,
    /// The stream failed. No callback follows.
    Error(String),
}

impl StreamEvent {
    /// Whether this is a `Data` event.
    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data(_))
    }

    /// Whether this is the normal-completion signal.
    pub fn is_finish(&self) -> bool {
        matches!(self, Self::Finish)
    }

    /// Whether this is the failure signal.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The payload, for `Data` events.
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Data(payload) => Some(payload),
            _ => None,
        }
    }
}

/// Per-call delivery phase: `Init → Streaming → {Finished | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Init,
    Streaming,
    Finished,
    Failed,
}

/// Latching wrapper around one call's event callback.
///
/// Guarantees the ordering contract: any number of `Data` transitions
/// while streaming, then exactly one terminal callback. Events arriving
/// after a terminal transition are dropped with a warning instead of being
/// delivered.
pub(crate) struct EventSink<F>
where
    F: Fn(StreamEvent),
{
    on_event: F,
    phase: Phase,
}

impl<F> EventSink<F>
where
    F: Fn(StreamEvent),
{
    pub(crate) fn new(on_event: F) -> Self {
        Self {
            on_event,
            phase: Phase::Init,
        }
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Finished | Phase::Failed)
    }

    /// Deliver a payload.
    pub(crate) fn data(&mut self, payload: String) {
        if self.is_terminal() {
            warn!("dropping data event after terminal transition");
            return;
        }
        self.phase = Phase::Streaming;
        (self.on_event)(StreamEvent::Data(payload));
    }

    /// Deliver the normal-completion signal, at most once.
    pub(crate) fn finish(&mut self) {
        if self.is_terminal() {
            warn!("dropping finish event after terminal transition");
            return;
        }
        self.phase = Phase::Finished;
        (self.on_event)(StreamEvent::Finish);
    }

    /// Deliver the failure signal, at most once.
    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        if self.is_terminal() {
            warn!("dropping error event after terminal transition");
            return;
        }
        self.phase = Phase::Failed;
        (self.on_event)(StreamEvent::Error(message.into()));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn collecting_sink(events: &Mutex<Vec<StreamEvent>>) -> EventSink<impl Fn(StreamEvent) + '_> {
        EventSink::new(move |event| events.lock().unwrap().push(event))
    }

    #[test]
    fn data_then_finish_in_order() {
        let events = Mutex::new(Vec::new());
        let mut sink = collecting_sink(&events);

        sink.data("a".into());
        sink.data("b".into());
        sink.finish();

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                StreamEvent::Data("a".into()),
                StreamEvent::Data("b".into()),
                StreamEvent::Finish,
            ]
        );
        assert_eq!(sink.phase(), Phase::Finished);
    }

    #[test]
    fn terminal_fires_at_most_once() {
        let events = Mutex::new(Vec::new());
        let mut sink = collecting_sink(&events);

        sink.fail("boom");
        sink.fail("boom again");
        sink.finish();
        sink.data("late".into());

        assert_eq!(*events.lock().unwrap(), vec![StreamEvent::Error("boom".into())]);
    }

    #[test]
    fn finish_without_data_is_valid() {
        let events = Mutex::new(Vec::new());
        let mut sink = collecting_sink(&events);
        sink.finish();
        assert_eq!(*events.lock().unwrap(), vec![StreamEvent::Finish]);
    }
}
