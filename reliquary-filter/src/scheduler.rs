//! A per-domain job scheduler: cooperative cancellation of a superseded job
//! plus a small fixed worker pool of plain OS threads, favored here over an
//! async runtime for CPU-bound scanning work.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use parking_lot::RwLock;

/// How often (in items processed) a job should check its cancellation flag.
pub const POLL_INTERVAL: usize = 1000;

/// Progress a running job may publish for the UI to sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct Progress {
    /// Items completed so far.
    pub completed: usize,
    /// The job's declared total, or `None` if it chose to run indeterminate.
    pub total: Option<usize>,
}

/// A handle a running job uses to cooperate with its scheduler: check for
/// cancellation and publish progress.
#[derive(Clone)]
pub struct JobHandle {
    pub(crate) cancelled: Arc<AtomicBool>,
    pub(crate) completed: Arc<AtomicUsize>,
    pub(crate) total: Arc<Mutex<Option<usize>>>,
}

impl JobHandle {
    /// Returns true if this job has been superseded and should stop.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Declares (or redeclares) this job's total item count. Not calling
    /// this at all leaves the job indeterminate.
    pub fn set_total(&self, total: usize) {
        *self.total.lock().unwrap() = Some(total);
    }

    /// Advances the completed-item counter by `n`.
    pub fn advance(&self, n: usize) {
        self.completed.fetch_add(n, Ordering::Relaxed);
    }

    /// Reads the current progress snapshot.
    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.completed.load(Ordering::Relaxed),
            total: *self.total.lock().unwrap(),
        }
    }
}

type JobFn<Id> = Box<dyn FnOnce(&JobHandle) -> Vec<Id> + Send>;

struct Job<Id> {
    handle: JobHandle,
    work: JobFn<Id>,
}

/// A scheduler for one list-view domain (Files, Strings, Content,
/// Conversations, Events). Submitting a new job cancels whichever job is
/// currently running or queued; a job's result only replaces the published
/// vector if it completes without being cancelled.
pub struct FilterScheduler<Id> {
    sender: Sender<Job<Id>>,
    workers: Vec<JoinHandle<()>>,
    results: Arc<RwLock<Arc<Vec<Id>>>>,
    current: Mutex<Option<JobHandle>>,
}

impl<Id: Send + 'static> FilterScheduler<Id> {
    /// Spawns `worker_count` OS threads backing this scheduler. A
    /// domain-sized pool (typically 1-4) is enough: the workload is
    /// CPU-bound scanning over in-memory slices, not I/O-bound waiting.
    pub fn new(worker_count: usize) -> Self {
        let (sender, receiver): (Sender<Job<Id>>, Receiver<Job<Id>>) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));
        let results: Arc<RwLock<Arc<Vec<Id>>>> = Arc::new(RwLock::new(Arc::new(Vec::new())));

        let workers = (0..worker_count.max(1))
            .map(|_| {
                let receiver = Arc::clone(&receiver);
                let results = Arc::clone(&results);
                std::thread::spawn(move || loop {
                    let job = {
                        let receiver = receiver.lock().unwrap();
                        receiver.recv()
                    };
                    let Ok(job) = job else {
                        return;
                    };
                    let output = (job.work)(&job.handle);
                    if !job.handle.is_cancelled() {
                        *results.write() = Arc::new(output);
                    }
                })
            })
            .collect();

        FilterScheduler {
            sender,
            workers,
            results,
            current: Mutex::new(None),
        }
    }

    /// Cancels whatever job is current, then submits `work` as the new
    /// current job. `work` receives a [`JobHandle`] it should poll roughly
    /// every [`POLL_INTERVAL`] items and return early from on cancellation.
    ///
    /// Cancellation is idempotent: cancelling an already-finished or
    /// already-cancelled job is a no-op.
    pub fn submit(&self, work: impl FnOnce(&JobHandle) -> Vec<Id> + Send + 'static) {
        let handle = JobHandle {
            cancelled: Arc::new(AtomicBool::new(false)),
            completed: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(Mutex::new(None)),
        };
        {
            let mut current = self.current.lock().unwrap();
            if let Some(prev) = current.take() {
                prev.cancelled.store(true, Ordering::Relaxed);
            }
            *current = Some(handle.clone());
        }
        let _ = self.sender.send(Job {
            handle,
            work: Box::new(work),
        });
    }

    /// The most recently published, non-cancelled result vector. Readers
    /// never block a writer publishing a fresh snapshot.
    pub fn results(&self) -> Arc<Vec<Id>> {
        Arc::clone(&self.results.read())
    }

    /// Progress of the currently submitted job, if one is in flight.
    pub fn current_progress(&self) -> Option<Progress> {
        self.current.lock().unwrap().as_ref().map(JobHandle::progress)
    }
}

impl<Id> Drop for FilterScheduler<Id> {
    fn drop(&mut self) {
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_submit_publishes_result() {
        let scheduler: FilterScheduler<u32> = FilterScheduler::new(1);
        scheduler.submit(|_handle| vec![1, 2, 3]);
        sleep(Duration::from_millis(50));
        assert_eq!(*scheduler.results(), vec![1, 2, 3]);
    }

    #[test]
    fn test_superseding_job_cancels_previous() {
        let scheduler: FilterScheduler<u32> = FilterScheduler::new(1);
        scheduler.submit(|handle| {
            for _ in 0..50 {
                if handle.is_cancelled() {
                    return vec![999];
                }
                sleep(Duration::from_millis(5));
            }
            vec![1]
        });
        sleep(Duration::from_millis(10));
        scheduler.submit(|_handle| vec![2, 3]);
        sleep(Duration::from_millis(200));
        assert_eq!(*scheduler.results(), vec![2, 3]);
    }

    #[test]
    fn test_progress_tracking() {
        let scheduler: FilterScheduler<u32> = FilterScheduler::new(1);
        scheduler.submit(|handle| {
            handle.set_total(10);
            for _ in 0..10 {
                handle.advance(1);
            }
            vec![42]
        });
        sleep(Duration::from_millis(50));
        assert_eq!(*scheduler.results(), vec![42]);
    }
}
