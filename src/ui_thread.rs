/*
 * Cross-thread escape hatch. Window handles are thread-affine, so work from
 * other threads is queued here and the owning thread is woken with a posted
 * message; the window procedure then drains the queue. Fire-and-forget: no
 * return channel and no cancellation.
 */
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

pub struct UiTaskQueue {
    tx: Sender<UiTask>,
    rx: Receiver<UiTask>,
}

impl fmt::Debug for UiTaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiTaskQueue").finish_non_exhaustive()
    }
}

impl Default for UiTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl UiTaskQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> UiTaskSender {
        UiTaskSender {
            tx: self.tx.clone(),
        }
    }

    /// Runs every queued task on the calling thread, in submission order.
    /// Returns how many ran.
    pub fn drain(&self) -> usize {
        let mut count = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            count += 1;
        }
        if count > 0 {
            log::trace!("UiTaskQueue: ran {count} task(s) on the UI thread");
        }
        count
    }
}

/// Sending half of a `UiTaskQueue`; `Send + Clone`, usable from any thread.
#[derive(Clone)]
pub struct UiTaskSender {
    tx: Sender<UiTask>,
}

impl fmt::Debug for UiTaskSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiTaskSender").finish_non_exhaustive()
    }
}

impl UiTaskSender {
    /// Queues `task`. Returns false if the queue no longer exists.
    pub fn push<F>(&self, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx.send(Box::new(task)).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::thread;

    #[test]
    fn tasks_from_other_threads_run_in_order_on_drain() {
        // Arrange
        let queue = UiTaskQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let sender = queue.sender();
        let log_worker = Arc::clone(&log);
        // Act
        thread::spawn(move || {
            for i in 0..3 {
                let log = Arc::clone(&log_worker);
                assert!(sender.push(move || log.lock().unwrap().push(i)));
            }
        })
        .join()
        .unwrap();
        // Assert
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(queue.drain(), 3);
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(queue.drain(), 0);
    }

    #[test]
    fn push_after_queue_dropped_reports_failure() {
        let queue = UiTaskQueue::new();
        let sender = queue.sender();
        drop(queue);
        assert!(!sender.push(|| {}));
    }
}
