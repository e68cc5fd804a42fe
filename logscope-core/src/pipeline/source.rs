use std::io::{self, BufRead};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Result of asking a source for its next line.
#[derive(Debug, PartialEq, Eq)]
pub enum Pulled {
    Line(String),
    /// Nothing arrived within the source's poll interval.
    Idle,
    Exhausted,
}

/// Pull-based supply of raw lines for the controller.
pub trait LineSource {
    fn pull(&mut self) -> io::Result<Pulled>;
}

/// Wraps any iterator of lines, e.g. `BufRead::lines()` over a file.
pub struct IterSource<I> {
    lines: I,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    pub fn new(lines: I) -> Self {
        Self { lines }
    }
}

impl<R: BufRead> IterSource<io::Lines<R>> {
    pub fn from_reader(reader: R) -> Self {
        Self::new(reader.lines())
    }
}

impl<I> LineSource for IterSource<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    fn pull(&mut self) -> io::Result<Pulled> {
        match self.lines.next() {
            Some(line) => line.map(Pulled::Line),
            None => Ok(Pulled::Exhausted),
        }
    }
}

/// Reads on a dedicated thread and hands lines over a channel. `pull` waits
/// at most `poll` before returning [`Pulled::Idle`].
pub struct ChannelSource {
    rx: mpsc::Receiver<io::Result<String>>,
    poll: Duration,
    reader: Option<JoinHandle<()>>,
}

impl ChannelSource {
    /// `open` runs on the reader thread, which lets it own non-`Send`
    /// handles such as a locked stdin.
    pub fn spawn<F, R>(open: F, poll: Duration) -> Self
    where
        F: FnOnce() -> R + Send + 'static,
        R: BufRead,
    {
        let (tx, rx) = mpsc::channel::<io::Result<String>>();

        let reader = thread::spawn(move || {
            let reader = open();
            for line in reader.lines() {
                let failed = line.is_err();
                // If receiver is gone, stop early.
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
            // tx is dropped here, which will disconnect rx.
        });

        Self {
            rx,
            poll,
            reader: Some(reader),
        }
    }
}

impl LineSource for ChannelSource {
    fn pull(&mut self) -> io::Result<Pulled> {
        match self.rx.recv_timeout(self.poll) {
            Ok(line) => line.map(Pulled::Line),
            Err(RecvTimeoutError::Timeout) => Ok(Pulled::Idle),
            Err(RecvTimeoutError::Disconnected) => {
                // Join reader thread (best effort)
                if let Some(handle) = self.reader.take() {
                    let _ = handle.join();
                }
                Ok(Pulled::Exhausted)
            }
        }
    }
}

/// Cooperative cancellation flag checked by the controller between pulls.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
