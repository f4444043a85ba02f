use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(pub Uuid);

impl TimerId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One-shot deferred callback scheduled by the shell. The core holds at most
/// one live timer and cancels it before scheduling a replacement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "data")]
pub enum TimerOperation {
    Start { id: TimerId, millis: u64 },
    Cancel { id: TimerId },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum TimerOutput {
    Elapsed { id: TimerId },
    Cleared { id: TimerId },
}

impl TimerOutput {
    #[must_use]
    pub const fn id(&self) -> TimerId {
        match self {
            Self::Elapsed { id } | Self::Cleared { id } => *id,
        }
    }

    #[must_use]
    pub const fn is_elapsed(&self) -> bool {
        matches!(self, Self::Elapsed { .. })
    }
}

impl Operation for TimerOperation {
    type Output = TimerOutput;
}

pub struct Timer<Ev> {
    context: CapabilityContext<TimerOperation, Ev>,
}

impl<Ev> Capability<Ev> for Timer<Ev> {
    type Operation = TimerOperation;
    type MappedSelf<MappedEv> = Timer<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Timer::new(self.context.map_event(f))
    }
}

impl<Ev> Timer<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<TimerOperation, Ev>) -> Self {
        Self { context }
    }

    /// Asks the shell to call back after `millis`. The response carries the
    /// timer id so callers can tell a live timer from a superseded one.
    pub fn notify_after<F>(&self, id: TimerId, millis: u64, make_event: F)
    where
        F: Fn(TimerOutput) -> Ev + Send + Sync + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let output = context
                .request_from_shell(TimerOperation::Start { id, millis })
                .await;
            context.update_app(make_event(output));
        });
    }

    pub fn cancel(&self, id: TimerId) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(TimerOperation::Cancel { id }).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(TimerId::generate(), TimerId::generate());
    }

    #[test]
    fn test_output_accessors() {
        let id = TimerId::generate();
        assert!(TimerOutput::Elapsed { id }.is_elapsed());
        assert!(!TimerOutput::Cleared { id }.is_elapsed());
        assert_eq!(TimerOutput::Elapsed { id }.id(), id);
        assert_eq!(TimerOutput::Cleared { id }.id(), id);
    }

    #[test]
    fn test_operation_serialization() {
        let op = TimerOperation::Start {
            id: TimerId::generate(),
            millis: 3000,
        };
        let json = serde_json::to_string(&op).unwrap();
        let deserialized: TimerOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(op, deserialized);
    }

    #[test]
    fn test_cancel_serialization() {
        let op = TimerOperation::Cancel {
            id: TimerId::generate(),
        };
        let json = serde_json::to_string(&op).unwrap();
        let deserialized: TimerOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(op, deserialized);
    }
}
