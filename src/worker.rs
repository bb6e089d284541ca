use std::sync::mpsc;
use std::time::Duration;

pub const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(24);

#[derive(Debug, PartialEq, Eq)]
pub enum WorkerPoll<T> {
    Pending,
    Ready(T),
    /// The worker thread ended without sending a result.
    Lost,
}

/// Receiving end of a one-shot background job.
///
/// Dropping the ticket abandons the job: the worker still runs to completion
/// but its result is discarded.
#[derive(Debug)]
pub struct WorkerTicket<T> {
    label: &'static str,
    rx: mpsc::Receiver<T>,
}

impl<T> WorkerTicket<T> {
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn poll(&self) -> WorkerPoll<T> {
        match self.rx.try_recv() {
            Ok(result) => WorkerPoll::Ready(result),
            Err(mpsc::TryRecvError::Empty) => WorkerPoll::Pending,
            Err(mpsc::TryRecvError::Disconnected) => WorkerPoll::Lost,
        }
    }

    /// Blocks until the job finishes. `None` when the worker died.
    pub fn wait(self) -> Option<T> {
        self.rx.recv().ok()
    }
}

pub fn spawn_worker_action<T, W>(label: &'static str, work: W) -> WorkerTicket<T>
where
    T: Send + 'static,
    W: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<T>();
    std::thread::spawn(move || {
        let result = work();
        if tx.send(result).is_err() {
            tracing::debug!(label, "worker result dropped; ticket was abandoned");
        }
    });
    tracing::debug!(label, "worker action spawned");
    WorkerTicket { label, rx }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_delivers_result_once() {
        let ticket = spawn_worker_action("sum", || 2 + 3);
        assert_eq!(ticket.label(), "sum");
        assert_eq!(ticket.wait(), Some(5));
    }

    #[test]
    fn poll_reports_pending_then_ready() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let ticket = spawn_worker_action("gated", move || {
            let _ = release_rx.recv();
            "done"
        });

        assert_eq!(ticket.poll(), WorkerPoll::Pending);
        release_tx.send(()).expect("worker should be waiting");

        let mut outcome = WorkerPoll::Pending;
        for _ in 0..500 {
            outcome = ticket.poll();
            if outcome != WorkerPoll::Pending {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(outcome, WorkerPoll::Ready("done"));
    }

    #[test]
    fn panicking_worker_is_reported_as_lost() {
        let ticket: WorkerTicket<u8> = spawn_worker_action("boom", || panic!("worker failed"));
        let mut outcome = WorkerPoll::Pending;
        for _ in 0..500 {
            outcome = ticket.poll();
            if outcome != WorkerPoll::Pending {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(outcome, WorkerPoll::Lost);
    }
}
