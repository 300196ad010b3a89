use std::collections::{BTreeMap, VecDeque};
use std::marker::PhantomData;

/// Monotonic position of an event within its topic.
pub type EventSeq = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<E> {
    pub seq: EventSeq,
    pub payload: E,
}

/// Receiving end of a [`Topic`].
///
/// Typed by payload, so a subscription taken on one topic cannot be polled
/// against a topic carrying a different event shape.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Subscription<E> {
    id: u64,
    _payload: PhantomData<fn() -> E>,
}

impl<E> Subscription<E> {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Single-kind publish/subscribe channel.
///
/// Every subscriber reads events in publish order through its own cursor.
/// Events are retained until all live subscribers have read them; a topic
/// with no subscribers drops events on publish.
#[derive(Debug)]
pub struct Topic<E> {
    kind: &'static str,
    next_seq: EventSeq,
    next_subscriber: u64,
    events: VecDeque<Envelope<E>>,
    cursors: BTreeMap<u64, EventSeq>,
}

impl<E: Clone> Topic<E> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            next_seq: 0,
            next_subscriber: 0,
            events: VecDeque::new(),
            cursors: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Subscribes from the next published event onwards.
    pub fn subscribe(&mut self) -> Subscription<E> {
        let id = self.next_subscriber;
        self.next_subscriber += 1;
        self.cursors.insert(id, self.next_seq);
        Subscription {
            id,
            _payload: PhantomData,
        }
    }

    pub fn unsubscribe(&mut self, sub: Subscription<E>) {
        self.cursors.remove(&sub.id);
        self.compact();
    }

    pub fn subscriber_count(&self) -> usize {
        self.cursors.len()
    }

    pub fn publish(&mut self, payload: E) -> EventSeq {
        let seq = self.next_seq;
        self.next_seq += 1;
        if !self.cursors.is_empty() {
            self.events.push_back(Envelope { seq, payload });
        }
        seq
    }

    /// Number of events `sub` has not read yet.
    pub fn pending(&self, sub: &Subscription<E>) -> usize {
        let Some(cursor) = self.cursors.get(&sub.id) else {
            return 0;
        };
        self.events.iter().filter(|e| e.seq >= *cursor).count()
    }

    /// Returns every unread event for `sub` and advances its cursor.
    pub fn poll(&mut self, sub: &Subscription<E>) -> Vec<E> {
        let Some(cursor) = self.cursors.get_mut(&sub.id) else {
            return Vec::new();
        };
        let out: Vec<E> = self
            .events
            .iter()
            .filter(|e| e.seq >= *cursor)
            .map(|e| e.payload.clone())
            .collect();
        *cursor = self.next_seq;
        self.compact();
        out
    }

    /// Number of events still buffered for slow subscribers.
    pub fn retained(&self) -> usize {
        self.events.len()
    }

    fn compact(&mut self) {
        let Some(min_cursor) = self.cursors.values().copied().min() else {
            self.events.clear();
            return;
        };
        while self.events.front().is_some_and(|e| e.seq < min_cursor) {
            self.events.pop_front();
        }
    }
}
