//! Audio → control notification channel.
//!
//! The audio dispatcher and the retune worker each own a producer; the control
//! thread drains both through one [`NotificationInbox`].

use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notification {
    /// One or more stops changed confirmed state, or a tremulant flipped.
    /// Consumers re-read full state.
    StopsUpdated,
    /// Startup finished; topology and initial wavetables are ready.
    LoadComplete,
    /// A retune was published.
    Retuned,
}

pub struct NotificationProducer {
    producer: HeapProd<Notification>,
}

impl NotificationProducer {
    /// Returns true if the notification was queued, false if the channel is full.
    #[inline]
    pub fn push(&mut self, notification: Notification) -> bool {
        self.producer.try_push(notification).is_ok()
    }
}

pub struct NotificationConsumer {
    consumer: HeapCons<Notification>,
}

impl NotificationConsumer {
    #[inline]
    pub fn pop(&mut self) -> Option<Notification> {
        self.consumer.try_pop()
    }

    #[inline]
    pub fn has_pending(&self) -> bool {
        !self.consumer.is_empty()
    }
}

/// Create a notification channel with the given capacity.
pub fn notification_channel(capacity: usize) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::new(capacity);
    let (producer, consumer) = rb.split();
    (
        NotificationProducer { producer },
        NotificationConsumer { consumer },
    )
}

/// Control-side view over every notification source.
pub struct NotificationInbox {
    engine: NotificationConsumer,
    retune: NotificationConsumer,
}

impl NotificationInbox {
    pub fn new(engine: NotificationConsumer, retune: NotificationConsumer) -> Self {
        Self { engine, retune }
    }

    /// Pop every queued notification, engine first, handing each to `f`.
    pub fn drain(&mut self, mut f: impl FnMut(Notification)) -> usize {
        let mut count = 0;
        for source in [&mut self.engine, &mut self.retune] {
            while let Some(notification) = source.pop() {
                f(notification);
                count += 1;
            }
        }
        count
    }

    pub fn has_pending(&self) -> bool {
        self.engine.has_pending() || self.retune.has_pending()
    }
}
