//! Cross thread work delivery to an instance's owning thread.
//!
//! External threads never touch native handles directly. They enqueue
//! closures here and the owning thread runs them between native
//! messages, in enqueue order. The queue is bounded so a wedged owning
//! thread exerts backpressure instead of growing without limit.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// A unit of work executed on the owning thread.
pub type WorkItem = Box<dyn FnOnce() + Send + 'static>;

/// Queued items before producers start blocking.
pub const QUEUE_CAPACITY: usize = 1 << 16;

/// Creates a connected producer and consumer pair.
pub fn work_queue() -> (DispatchQueue, DispatchDrain) {
    queue_with_capacity(QUEUE_CAPACITY)
}

fn queue_with_capacity(capacity: usize) -> (DispatchQueue, DispatchDrain) {
    let (tx, rx) = bounded(capacity);
    (DispatchQueue { tx }, DispatchDrain { rx })
}

/// Producer half. Clones freely across threads.
#[derive(Clone)]
pub struct DispatchQueue {
    tx: Sender<WorkItem>,
}

impl DispatchQueue {
    /// Enqueues a closure, blocking while the queue is full. Returns
    /// false when the consumer is gone.
    pub fn post<F>(&self, work: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx.send(Box::new(work)).is_ok()
    }

    /// Non blocking enqueue. Hands the closure back when the queue is
    /// full or the consumer is gone.
    pub fn try_post<F>(&self, work: F) -> Result<(), WorkItem>
    where
        F: FnOnce() + Send + 'static,
    {
        match self.tx.try_send(Box::new(work)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(item)) | Err(TrySendError::Disconnected(item)) => Err(item),
        }
    }
}

/// Consumer half, owned by the owning thread.
pub struct DispatchDrain {
    rx: Receiver<WorkItem>,
}

impl DispatchDrain {
    /// Runs every item currently queued, in enqueue order, and returns
    /// how many ran.
    pub fn drain(&self) -> usize {
        let mut ran = 0;
        while let Ok(item) = self.rx.try_recv() {
            item();
            ran += 1;
        }
        ran
    }

    /// Blocks for the next item. None when every producer is gone.
    pub fn recv(&self) -> Option<WorkItem> {
        self.rx.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;

    #[test]
    fn test_capacity_matches_contract() {
        assert_eq!(QUEUE_CAPACITY, 65536);
    }

    #[test]
    fn test_items_run_in_enqueue_order() {
        let (queue, drain) = work_queue();
        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..16 {
            let log = log.clone();
            assert!(queue.post(move || log.lock().unwrap().push(i)));
        }
        assert_eq!(drain.drain(), 16);
        assert_eq!(*log.lock().unwrap(), (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_per_producer_order_is_preserved() {
        let (queue, drain) = work_queue();
        let log = Arc::new(Mutex::new(Vec::new()));
        let producers: Vec<_> = (0..4)
            .map(|id| {
                let queue = queue.clone();
                let log = log.clone();
                thread::spawn(move || {
                    for seq in 0..1000 {
                        assert!(queue.post({
                            let log = log.clone();
                            move || log.lock().unwrap().push((id, seq))
                        }));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        assert_eq!(drain.drain(), 4000);
        let log = log.lock().unwrap();
        assert_eq!(log.len(), 4000);
        for id in 0..4 {
            let seqs: Vec<_> = log.iter().filter(|(i, _)| *i == id).map(|(_, s)| *s).collect();
            assert_eq!(seqs, (0..1000).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_full_queue_rejects_try_post() {
        let (queue, drain) = queue_with_capacity(2);
        assert!(queue.try_post(|| {}).is_ok());
        assert!(queue.try_post(|| {}).is_ok());
        // The rejected closure comes back runnable.
        let ran = Arc::new(AtomicUsize::new(0));
        let counted = {
            let ran = ran.clone();
            move || {
                ran.fetch_add(1, Ordering::SeqCst);
            }
        };
        let item = queue.try_post(counted).unwrap_err();
        item();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(drain.drain(), 2);
    }

    #[test]
    fn test_full_queue_blocks_then_resumes() {
        let (queue, drain) = queue_with_capacity(2);
        assert!(queue.post(|| {}));
        assert!(queue.post(|| {}));

        let posted = Arc::new(AtomicUsize::new(0));
        let producer = {
            let queue = queue.clone();
            let posted = posted.clone();
            thread::spawn(move || {
                assert!(queue.post(|| {}));
                posted.store(1, Ordering::SeqCst);
            })
        };

        // The producer parks until the consumer makes room.
        let item = drain.recv().unwrap();
        item();
        producer.join().unwrap();
        assert_eq!(posted.load(Ordering::SeqCst), 1);
        assert_eq!(drain.drain(), 2);
    }

    #[test]
    fn test_no_items_dropped_under_contention() {
        let (queue, drain) = work_queue();
        let counter = Arc::new(AtomicUsize::new(0));
        let producers: Vec<_> = (0..8)
            .map(|_| {
                let queue = queue.clone();
                let counter = counter.clone();
                thread::spawn(move || {
                    for _ in 0..1250 {
                        let counter = counter.clone();
                        assert!(queue.post(move || {
                            counter.fetch_add(1, Ordering::SeqCst);
                        }));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }
        let mut ran = 0;
        while ran < 10000 {
            ran += drain.drain();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 10000);
    }

    #[test]
    fn test_post_after_consumer_dropped() {
        let (queue, drain) = work_queue();
        drop(drain);
        assert!(!queue.post(|| {}));
        assert!(queue.try_post(|| {}).is_err());
    }
}
