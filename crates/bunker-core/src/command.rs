//! Cross-thread command hand-off.
//!
//! A `CommandQueue<T>` carries deferred work towards the thread that owns a
//! `T`. Producers on any thread call [`CommandQueue::enqueue`]; the owning
//! thread calls [`CommandQueue::drain_and_execute_all`] once per frame. The
//! simulation owns one queue targeting `Simulation`, the UI thread owns one
//! targeting `UiState`, and each side holds a clone of the other's.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{CommandError, CommandResult};

/// A deferred unit of work executed exactly once against the queue's target.
pub type Command<T> = Box<dyn FnOnce(&mut T) -> CommandResult + Send>;

/// Outcome of one drain.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub executed: usize,
    pub failed: usize,
}

/// Multi-producer, single-consumer FIFO of commands. Cloning shares the queue.
pub struct CommandQueue<T: ?Sized> {
    label: &'static str,
    pending: Arc<Mutex<Vec<Command<T>>>>,
}

impl<T: ?Sized> Clone for CommandQueue<T> {
    fn clone(&self) -> Self {
        Self {
            label: self.label,
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<T: ?Sized> CommandQueue<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Append a command. Never blocks beyond the short critical section of the push.
    pub fn enqueue<F>(&self, command: F)
    where
        F: FnOnce(&mut T) -> CommandResult + Send + 'static,
    {
        self.push(Box::new(command));
    }

    pub fn push(&self, command: Command<T>) {
        self.lock().push(command);
    }

    /// Swap the pending commands out under the lock.
    pub fn take_pending(&self) -> Vec<Command<T>> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Execute everything queued so far, in enqueue order, without holding the lock.
    ///
    /// Commands enqueued while draining land in the next drain. A command that
    /// returns an error or panics is logged and skipped.
    pub fn drain_and_execute_all(&self, target: &mut T) -> DrainReport {
        let commands = self.take_pending();
        let mut report = DrainReport::default();

        for command in commands {
            report.executed += 1;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| command(target)))
                .unwrap_or_else(|payload| Err(CommandError::Panicked(panic_message(&payload))));

            if let Err(e) = outcome {
                report.failed += 1;
                tracing::warn!("[{}] command failed: {}", self.label, e);
            }
        }

        if report.executed > 0 {
            tracing::trace!(
                "[{}] drained {} commands ({} failed)",
                self.label,
                report.executed,
                report.failed
            );
        }
        report
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Command<T>>> {
        // Commands never run under the lock, so poisoning can only come from a
        // panicking push; the Vec is still consistent in that case.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[derive(Default)]
    struct Log {
        entries: Vec<(usize, usize)>,
    }

    #[test]
    fn test_fifo_single_producer() {
        let queue: CommandQueue<Vec<i32>> = CommandQueue::new("test");
        for i in 0..5 {
            queue.enqueue(move |v: &mut Vec<i32>| {
                v.push(i);
                Ok(())
            });
        }
        let mut target = Vec::new();
        let report = queue.drain_and_execute_all(&mut target);
        assert_eq!(target, vec![0, 1, 2, 3, 4]);
        assert_eq!(report, DrainReport { executed: 5, failed: 0 });
        assert!(queue.is_empty());
    }

    #[test]
    fn test_concurrent_producers_keep_their_own_order() {
        let queue: CommandQueue<Log> = CommandQueue::new("test");
        let producers = 8;
        let per_producer = 200;

        let handles: Vec<_> = (0..producers)
            .map(|p| {
                let q = queue.clone();
                thread::spawn(move || {
                    for seq in 0..per_producer {
                        q.enqueue(move |log: &mut Log| {
                            log.entries.push((p, seq));
                            Ok(())
                        });
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut log = Log::default();
        let report = queue.drain_and_execute_all(&mut log);
        assert_eq!(report.executed, producers * per_producer);
        assert_eq!(log.entries.len(), producers * per_producer);

        let mut next_expected = vec![0usize; producers];
        for (p, seq) in &log.entries {
            assert_eq!(*seq, next_expected[*p], "producer {} reordered", p);
            next_expected[*p] += 1;
        }
        assert!(next_expected.iter().all(|&n| n == per_producer));
    }

    #[test]
    fn test_failing_command_does_not_block_the_rest() {
        let queue: CommandQueue<Vec<&'static str>> = CommandQueue::new("test");
        queue.enqueue(|v: &mut Vec<&'static str>| {
            v.push("first");
            Ok(())
        });
        queue.enqueue(|_: &mut Vec<&'static str>| Err(CommandError::failed("boom")));
        queue.enqueue(|_: &mut Vec<&'static str>| panic!("kaboom"));
        queue.enqueue(|v: &mut Vec<&'static str>| {
            v.push("last");
            Ok(())
        });

        let mut target = Vec::new();
        let report = queue.drain_and_execute_all(&mut target);
        assert_eq!(target, vec!["first", "last"]);
        assert_eq!(report, DrainReport { executed: 4, failed: 2 });
    }

    #[test]
    fn test_reentrant_enqueue_runs_next_drain() {
        struct Target {
            queue: CommandQueue<Target>,
            runs: u32,
        }
        let queue: CommandQueue<Target> = CommandQueue::new("test");
        let mut target = Target { queue: queue.clone(), runs: 0 };

        queue.enqueue(|t: &mut Target| {
            t.runs += 1;
            t.queue.enqueue(|t: &mut Target| {
                t.runs += 10;
                Ok(())
            });
            Ok(())
        });

        queue.drain_and_execute_all(&mut target);
        assert_eq!(target.runs, 1);
        assert_eq!(queue.len(), 1);

        queue.drain_and_execute_all(&mut target);
        assert_eq!(target.runs, 11);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_each_command_runs_exactly_once() {
        let queue: CommandQueue<u32> = CommandQueue::new("test");
        queue.enqueue(|n: &mut u32| {
            *n += 1;
            Ok(())
        });
        let mut n = 0;
        queue.drain_and_execute_all(&mut n);
        queue.drain_and_execute_all(&mut n);
        assert_eq!(n, 1);
    }
}
