//! Serial task queue.
//!
//! A [`SerialQueue`] owns a piece of state on a dedicated worker thread and
//! runs submitted jobs against it one at a time, in submission order. It is
//! the only path to the state: callers on other threads either fire and
//! forget ([`SerialQueue::dispatch`]) or block for a result
//! ([`SerialQueue::dispatch_sync`]).

use parking_lot::Mutex;
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::{self, JoinHandle, ThreadId};
use tracing::{debug, error, warn};

type Job<S> = Box<dyn FnOnce(&mut S) + Send>;

/// Strictly ordered, single-threaded executor over owned state `S`.
pub struct SerialQueue<S> {
    label: String,
    sender: Mutex<Option<mpsc::Sender<Job<S>>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: ThreadId,
}

impl<S: Send + 'static> SerialQueue<S> {
    /// Start a worker thread named `label` that owns `state`.
    ///
    /// # Errors
    /// Returns the OS error if the thread cannot be spawned.
    pub fn new(label: impl Into<String>, state: S) -> io::Result<Self> {
        let label = label.into();
        let (sender, receiver) = mpsc::channel::<Job<S>>();

        let worker_label = label.clone();
        let handle = thread::Builder::new()
            .name(label.clone())
            .spawn(move || run_worker(&worker_label, receiver, state))?;
        let worker_id = handle.thread().id();

        debug!("Serial queue '{}' started", label);

        Ok(Self {
            label,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(handle)),
            worker_id,
        })
    }

    /// Queue label (also the worker thread name).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Submit a job without waiting for it.
    ///
    /// Returns `false` if the queue has been shut down; the job is dropped.
    pub fn dispatch<F>(&self, job: F) -> bool
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        let sender = self.sender.lock();
        match sender.as_ref() {
            Some(tx) => tx.send(Box::new(job)).is_ok(),
            None => false,
        }
    }

    /// Submit a job and block until it has run, returning its result.
    ///
    /// Returns `None` if the queue has been shut down or the job panicked.
    ///
    /// # Panics
    /// Panics when called from the queue's own worker thread, which would
    /// otherwise wait on itself forever.
    pub fn dispatch_sync<R, F>(&self, job: F) -> Option<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut S) -> R + Send + 'static,
    {
        assert!(
            !self.is_current(),
            "dispatch_sync on queue '{}' from its own worker",
            self.label
        );

        let (tx, rx) = mpsc::sync_channel(1);
        let submitted = self.dispatch(move |state| {
            let _ = tx.send(job(state));
        });
        if !submitted {
            return None;
        }
        rx.recv().ok()
    }

    /// Block until every job submitted so far has run.
    ///
    /// Returns `false` if the queue is shut down.
    pub fn flush(&self) -> bool {
        self.dispatch_sync(|_| ()).is_some()
    }

    /// Whether the caller is running on this queue's worker.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.worker_id
    }

    /// Stop accepting jobs, let the worker drain what is queued and join it.
    ///
    /// When called from the worker itself the thread is detached instead of
    /// joined; it exits once the current job returns.
    pub fn shutdown(&self) {
        if self.sender.lock().take().is_none() {
            return;
        }

        let Some(handle) = self.worker.lock().take() else {
            return;
        };
        if self.is_current() {
            debug!("Serial queue '{}' shut down from its own worker", self.label);
            return;
        }
        if handle.join().is_err() {
            warn!("Serial queue '{}' worker terminated abnormally", self.label);
        }
        debug!("Serial queue '{}' stopped", self.label);
    }

    /// Whether [`SerialQueue::shutdown`] has been called.
    pub fn is_shut_down(&self) -> bool {
        self.sender.lock().is_none()
    }
}

impl<S> Drop for SerialQueue<S> {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop once pending jobs drain.
        self.sender.get_mut().take();
        if let Some(handle) = self.worker.get_mut().take() {
            if thread::current().id() != self.worker_id {
                let _ = handle.join();
            }
        }
    }
}

fn run_worker<S>(label: &str, receiver: mpsc::Receiver<Job<S>>, mut state: S) {
    while let Ok(job) = receiver.recv() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| job(&mut state))) {
            error!(
                "Job on serial queue '{}' panicked: {}",
                label,
                panic_message(payload.as_ref())
            );
        }
    }
}

/// Text of a panic payload, for logs.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
