use tokio::sync::broadcast;

use crate::event::TrackerEvent;

pub trait Dispatcher {
    fn dispatch(&self, event: TrackerEvent);
}

impl Dispatcher for broadcast::Sender<TrackerEvent> {
    fn dispatch(&self, event: TrackerEvent) {
        // no subscribers is not an error
        let _ = self.send(event);
    }
}
