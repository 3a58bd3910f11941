//! Work queue advancement between stages

use crate::payload::{FieldMap, Payload};

/// Build the next stage's payload by dequeuing the head of `remaining`.
///
/// An empty queue yields an empty `current` and an empty `remaining`.
pub fn advance(remaining: Vec<FieldMap>) -> Payload {
    let mut queue = remaining.into_iter();
    match queue.next() {
        Some(current) => Payload {
            current,
            remaining: queue.collect(),
        },
        None => Payload::default(),
    }
}
