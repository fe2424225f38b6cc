//! Note-changed notifications: from the control thread to whatever gives feedback.
//!
//! Observers are called synchronously on the control thread. [`note_channel`]
//! provides a bounded, lock-free queue for consumers on another thread; when it
//! is full new events are dropped rather than blocking the control loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// Default queue capacity for [`note_channel`].
pub const NOTE_CHANNEL_CAPACITY: usize = 64;

/// Emitted when the quantized note differs from the previous one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteChange {
    /// The new note number.
    pub note: i32,
    /// The note before the change, `None` for the first note.
    pub previous: Option<i32>,
    /// Frequency of `note` in Hz.
    pub frequency: f64,
    /// Wheel angle that produced the note, radians.
    pub angle: f64,
}

/// Receives note changes. Implemented for closures and [`NoteSender`].
pub trait NoteObserver: Send {
    fn note_changed(&mut self, change: &NoteChange);
}

impl<F> NoteObserver for F
where
    F: FnMut(&NoteChange) + Send,
{
    fn note_changed(&mut self, change: &NoteChange) {
        self(change)
    }
}

/// Producer half of a note channel.
pub struct NoteSender {
    producer: HeapProd<NoteChange>,
    dropped: Arc<AtomicU64>,
}

impl NoteSender {
    /// Events discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl NoteObserver for NoteSender {
    fn note_changed(&mut self, change: &NoteChange) {
        if self.producer.try_push(*change).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Consumer half of a note channel.
pub struct NoteReceiver {
    consumer: HeapCons<NoteChange>,
    dropped: Arc<AtomicU64>,
}

impl NoteReceiver {
    /// Non-blocking poll for the oldest pending change.
    pub fn poll(&mut self) -> Option<NoteChange> {
        self.consumer.try_pop()
    }

    /// Drain all pending changes, oldest first.
    pub fn drain(&mut self) -> Vec<NoteChange> {
        let mut changes = Vec::with_capacity(self.consumer.occupied_len());
        while let Some(change) = self.consumer.try_pop() {
            changes.push(change);
        }
        changes
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    /// Changes the sender discarded because this side fell behind.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Create a bounded note channel holding at most `capacity` pending changes.
pub fn note_channel(capacity: usize) -> (NoteSender, NoteReceiver) {
    let rb = HeapRb::<NoteChange>::new(capacity.max(1));
    let (producer, consumer) = rb.split();
    let dropped = Arc::new(AtomicU64::new(0));
    (
        NoteSender {
            producer,
            dropped: dropped.clone(),
        },
        NoteReceiver { consumer, dropped },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(note: i32) -> NoteChange {
        NoteChange {
            note,
            previous: None,
            frequency: 440.0,
            angle: 0.0,
        }
    }

    #[test]
    fn send_and_poll() {
        let (mut tx, mut rx) = note_channel(4);
        assert!(rx.is_empty());
        tx.note_changed(&change(49));
        assert!(!rx.is_empty());
        assert_eq!(rx.poll().map(|c| c.note), Some(49));
        assert!(rx.poll().is_none());
    }

    #[test]
    fn ordering_preserved() {
        let (mut tx, mut rx) = note_channel(8);
        for note in [40, 42, 44] {
            tx.note_changed(&change(note));
        }
        let notes: Vec<i32> = rx.drain().into_iter().map(|c| c.note).collect();
        assert_eq!(notes, vec![40, 42, 44]);
    }

    #[test]
    fn full_channel_drops_newest() {
        let (mut tx, mut rx) = note_channel(2);
        for note in [1, 2, 3, 4] {
            tx.note_changed(&change(note));
        }
        assert_eq!(tx.dropped(), 2);
        assert_eq!(rx.dropped(), 2);
        let notes: Vec<i32> = rx.drain().into_iter().map(|c| c.note).collect();
        assert_eq!(notes, vec![1, 2]);
    }

    #[test]
    fn closure_observer() {
        let mut seen = Vec::new();
        {
            let mut observer = |c: &NoteChange| seen.push(c.note);
            observer.note_changed(&change(7));
            observer.note_changed(&change(8));
        }
        assert_eq!(seen, vec![7, 8]);
    }
}
