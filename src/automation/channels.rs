// Event channel between the worker and its observers.
use super::types::AutomationEvent;
use tokio::sync::mpsc;

/// Create the event channel the engine pushes notifications into.
///
/// Unbounded so the worker never waits on a slow receiver; the event volume
/// is a handful per state transition.
pub fn event_channel() -> (
    mpsc::UnboundedSender<AutomationEvent>,
    mpsc::UnboundedReceiver<AutomationEvent>,
) {
    mpsc::unbounded_channel()
}
