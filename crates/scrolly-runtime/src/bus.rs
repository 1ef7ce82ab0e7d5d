#![forbid(unsafe_code)]

//! Content-update bus.
//!
//! Fire-and-forget publish/subscribe between step resolution and the content
//! renderers. Publishers never see a return value from subscribers; the only
//! feedback is how many subscribers a message reached.
//!
//! Subscribers are either callbacks, run synchronously inside
//! [`Bus::publish`], or [`mpsc`] channels for renderers living elsewhere. A
//! channel whose receiver is gone is dropped on the next publish.
//!
//! Every subscription has a [`SubscriptionId`]; dropping interest is an
//! explicit [`Bus::unsubscribe`].

use std::fmt;
use std::sync::mpsc;

use scrolly_core::event::Direction;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::{ImageSpec, MapSpec};
use crate::resolve::ChartUpdate;

/// Identifier handed out by [`Bus::subscribe`].
pub type SubscriptionId = u64;

/// Message categories a subscriber can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topic {
    Chart,
    Map,
    Image,
    StepEnter,
    StepExit,
    MapProgress,
}

impl Topic {
    pub const ALL: [Topic; 6] = [
        Topic::Chart,
        Topic::Map,
        Topic::Image,
        Topic::StepEnter,
        Topic::StepExit,
        Topic::MapProgress,
    ];
}

/// A published notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "topic", rename_all = "camelCase")]
pub enum Message {
    Chart(ChartUpdate),
    Map(MapSpec),
    Image(ImageSpec),
    #[serde(rename_all = "camelCase")]
    StepEnter {
        index: usize,
        direction: Direction,
        step_name: Option<String>,
    },
    StepExit {
        index: usize,
        direction: Direction,
    },
    MapProgress {
        progress: f64,
        direction: Direction,
        map: MapSpec,
    },
}

impl Message {
    pub fn topic(&self) -> Topic {
        match self {
            Self::Chart(_) => Topic::Chart,
            Self::Map(_) => Topic::Map,
            Self::Image(_) => Topic::Image,
            Self::StepEnter { .. } => Topic::StepEnter,
            Self::StepExit { .. } => Topic::StepExit,
            Self::MapProgress { .. } => Topic::MapProgress,
        }
    }
}

enum Sink {
    Callback(Box<dyn FnMut(&Message)>),
    Channel(mpsc::Sender<Message>),
}

struct Subscriber {
    id: SubscriptionId,
    topics: Vec<Topic>,
    sink: Sink,
}

impl Subscriber {
    fn wants(&self, topic: Topic) -> bool {
        self.topics.contains(&topic)
    }
}

/// Single-threaded message bus.
#[derive(Default)]
pub struct Bus {
    subscribers: Vec<Subscriber>,
    next_id: SubscriptionId,
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("subscribers", &self.subscribers.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, topics: &[Topic], sink: Sink) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            topics: topics.to_vec(),
            sink,
        });
        debug!(id, ?topics, "bus subscriber added");
        id
    }

    /// Call `callback` for every message on `topics`.
    pub fn subscribe<F>(&mut self, topics: &[Topic], callback: F) -> SubscriptionId
    where
        F: FnMut(&Message) + 'static,
    {
        self.add(topics, Sink::Callback(Box::new(callback)))
    }

    /// Receive messages on `topics` through a channel.
    pub fn subscribe_channel(&mut self, topics: &[Topic]) -> (SubscriptionId, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel();
        (self.add(topics, Sink::Channel(tx)), rx)
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        before != self.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver `message` to every interested subscriber.
    ///
    /// Returns how many received it.
    pub fn publish(&mut self, message: Message) -> usize {
        let topic = message.topic();
        let mut delivered = 0;
        let mut disconnected = Vec::new();

        for sub in self.subscribers.iter_mut().filter(|s| s.wants(topic)) {
            match &mut sub.sink {
                Sink::Callback(callback) => {
                    callback(&message);
                    delivered += 1;
                }
                Sink::Channel(tx) => {
                    if tx.send(message.clone()).is_ok() {
                        delivered += 1;
                    } else {
                        disconnected.push(sub.id);
                    }
                }
            }
        }

        if !disconnected.is_empty() {
            debug!(?disconnected, "dropping disconnected bus subscribers");
            self.subscribers.retain(|s| !disconnected.contains(&s.id));
        }
        trace!(?topic, delivered, "published");
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn exit(index: usize) -> Message {
        Message::StepExit {
            index,
            direction: Direction::Down,
        }
    }

    #[test]
    fn callbacks_receive_their_topics_only() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = Bus::new();
        let sink = Rc::clone(&seen);
        bus.subscribe(&[Topic::StepExit], move |m| sink.borrow_mut().push(m.clone()));

        assert_eq!(bus.publish(exit(1)), 1);
        assert_eq!(bus.publish(Message::Image(ImageSpec::default())), 0);
        assert_eq!(*seen.borrow(), vec![exit(1)]);
    }

    #[test]
    fn publish_with_no_subscribers_is_fine() {
        let mut bus = Bus::new();
        assert_eq!(bus.publish(exit(0)), 0);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut bus = Bus::new();
        let id = bus.subscribe(&Topic::ALL, |_| {});
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.publish(exit(0)), 0);
    }

    #[test]
    fn channel_subscribers_and_disconnects() {
        let mut bus = Bus::new();
        let (_, rx) = bus.subscribe_channel(&[Topic::StepExit]);
        let (_, dropped) = bus.subscribe_channel(&[Topic::StepExit]);
        drop(dropped);

        assert_eq!(bus.publish(exit(4)), 1);
        assert_eq!(rx.try_recv().unwrap(), exit(4));
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn ids_are_unique() {
        let mut bus = Bus::new();
        let a = bus.subscribe(&[Topic::Chart], |_| {});
        let b = bus.subscribe(&[Topic::Chart], |_| {});
        assert_ne!(a, b);
    }

    #[test]
    fn messages_serialize_with_topic_tag() {
        let json = serde_json::to_value(Message::StepEnter {
            index: 2,
            direction: Direction::Up,
            step_name: Some("intro".into()),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"topic": "stepEnter", "index": 2, "direction": "up", "stepName": "intro"})
        );
    }
}
