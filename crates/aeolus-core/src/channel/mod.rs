//! Bounded SPSC channels between the control and audio threads.

mod command;
mod notification;

pub use command::{command_channel, Command, CommandConsumer, CommandProducer};
pub use notification::{
    notification_channel, Notification, NotificationConsumer, NotificationInbox,
    NotificationProducer,
};
