//! Cross-context message channel
//!
//! One lock-free single-producer/single-consumer ring per direction. Sending
//! never blocks and never allocates: when a ring is full the message is
//! refused and handed back. Messages within one direction arrive in send
//! order; the two directions are independent.
//!
//! ```text
//! Renderer (real-time)                         Producer
//!     │                                            │
//! [RendererLink.requests]──(ring)──►[ProducerLink.requests]
//! [RendererLink.chunks]◄───(ring)───[ProducerLink.chunks]
//! ```

use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::error::SendError;
use crate::message::Message;

/// Ring slots for renderer -> producer requests
///
/// The single-flight latch keeps at most one request in flight, so a few
/// slots are plenty.
pub const REQUEST_CAPACITY: usize = 4;

/// Extra chunk slots beyond the queue's high-water mark
pub const CHUNK_HEADROOM: usize = 4;

/// Sending half of one direction
pub struct MessageSender {
    ring: HeapProd<Message>,
}

impl MessageSender {
    /// Try to send, returning the message if the ring is full
    pub fn try_send(&mut self, message: Message) -> Result<(), SendError<Message>> {
        self.ring.try_push(message).map_err(SendError)
    }

    /// Send, dropping the message if the ring is full
    ///
    /// Returns true if the message was queued.
    pub fn send(&mut self, message: Message) -> bool {
        self.try_send(message).is_ok()
    }

    /// Free slots remaining
    pub fn vacant(&self) -> usize {
        self.ring.vacant_len()
    }
}

/// Receiving half of one direction
pub struct MessageReceiver {
    ring: HeapCons<Message>,
}

impl MessageReceiver {
    /// Take the oldest pending message, if any
    pub fn try_recv(&mut self) -> Option<Message> {
        self.ring.try_pop()
    }

    /// Messages waiting to be received
    pub fn pending(&self) -> usize {
        self.ring.occupied_len()
    }
}

/// Real-time side of the channel
pub struct RendererLink {
    /// Refill requests towards the producer
    pub requests: MessageSender,
    /// Chunks arriving from the producer
    pub chunks: MessageReceiver,
}

/// Producer side of the channel
pub struct ProducerLink {
    /// Refill requests arriving from the renderer
    pub requests: MessageReceiver,
    /// Chunks towards the renderer
    pub chunks: MessageSender,
}

fn ring(capacity: usize) -> (MessageSender, MessageReceiver) {
    let (prod, cons) = HeapRb::<Message>::new(capacity.max(1)).split();
    (MessageSender { ring: prod }, MessageReceiver { ring: cons })
}

/// Create a linked pair with room for `chunk_capacity` chunks in flight
pub fn channel(chunk_capacity: usize) -> (RendererLink, ProducerLink) {
    let (request_tx, request_rx) = ring(REQUEST_CAPACITY);
    let (chunk_tx, chunk_rx) = ring(chunk_capacity);
    (
        RendererLink {
            requests: request_tx,
            chunks: chunk_rx,
        },
        ProducerLink {
            requests: request_rx,
            chunks: chunk_tx,
        },
    )
}

/// Create a linked pair sized for a queue with the given high-water mark
pub fn channel_for_high_water(high_water: usize) -> (RendererLink, ProducerLink) {
    channel(high_water + CHUNK_HEADROOM)
}
