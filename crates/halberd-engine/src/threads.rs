//! Lazy SMP: a fixed pool of persistent search threads.
//!
//! Every worker searches its own copy of the root position; they cooperate
//! only through the shared transposition table. Worker 0 is the primary: it
//! reports progress, its result is the search result, and it stops the
//! helpers when it finishes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use halberd_core::Position;

use crate::error::EngineError;
use crate::search::info::SearchInfo;
use crate::search::tt::TranspositionTable;
use crate::search::{IterationReport, Search, SearchResult};
use crate::time::TimeManager;

/// Stack size of a search thread. Each ply of recursion keeps a move
/// picker on the stack.
const WORKER_STACK_SIZE: usize = 16 * 1024 * 1024;

/// Receives a report after every completed iteration.
pub type Reporter = Box<dyn FnMut(&IterationReport) + Send>;

/// Called by the primary worker with the final result, before `wait`
/// returns.
pub type Completion = Box<dyn FnOnce(&SearchResult) + Send>;

/// One search request for one worker.
struct Task {
    pos: Position,
    tt: Arc<TranspositionTable>,
    time: Arc<TimeManager>,
    depth: u32,
    counters: Arc<[AtomicU64]>,
    reporter: Option<Reporter>,
    on_complete: Option<Completion>,
    done: Sender<Finished>,
}

enum Message {
    Search(Box<Task>),
    ClearHistory,
    Quit,
}

/// Sent by a worker when its task is over. Only the primary carries a result.
struct Finished {
    result: Option<SearchResult>,
}

struct Worker {
    sender: Sender<Message>,
    handle: Option<JoinHandle<()>>,
}

/// Owns the search threads and hands them work.
pub struct ThreadManager {
    workers: Vec<Worker>,
    counters: Arc<[AtomicU64]>,
    done: Option<Receiver<Finished>>,
    pending: usize,
    result: Option<SearchResult>,
}

impl ThreadManager {
    /// Start `threads` idle workers (at least one).
    pub fn new(threads: usize) -> Result<ThreadManager, EngineError> {
        let threads = threads.max(1);
        let mut workers = Vec::with_capacity(threads);
        for id in 0..threads {
            let (sender, receiver) = mpsc::channel();
            let handle = thread::Builder::new()
                .name(format!("halberd-search-{id}"))
                .stack_size(WORKER_STACK_SIZE)
                .spawn(move || worker_loop(id, receiver))?;
            workers.push(Worker { sender, handle: Some(handle) });
        }
        info!(threads, "search threads started");
        Ok(ThreadManager {
            workers,
            counters: (0..threads).map(|_| AtomicU64::new(0)).collect(),
            done: None,
            pending: 0,
            result: None,
        })
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// `true` while some worker has not reported back.
    pub fn is_searching(&self) -> bool {
        self.pending > 0
    }

    /// Hand every worker a copy of `pos` and return immediately.
    ///
    /// Any previous search must have been collected with [`wait`](Self::wait).
    pub fn start(
        &mut self,
        pos: &Position,
        tt: Arc<TranspositionTable>,
        time: Arc<TimeManager>,
        depth: u32,
        mut reporter: Option<Reporter>,
        mut on_complete: Option<Completion>,
    ) {
        debug_assert!(self.pending == 0, "search started while another is running");
        for counter in self.counters.iter() {
            counter.store(0, Ordering::Relaxed);
        }
        let (done_tx, done_rx) = mpsc::channel();
        self.pending = 0;
        self.result = None;

        for (id, worker) in self.workers.iter().enumerate() {
            let task = Task {
                pos: pos.clone(),
                tt: Arc::clone(&tt),
                time: Arc::clone(&time),
                depth,
                counters: Arc::clone(&self.counters),
                reporter: if id == 0 { reporter.take() } else { None },
                on_complete: if id == 0 { on_complete.take() } else { None },
                done: done_tx.clone(),
            };
            if worker.sender.send(Message::Search(Box::new(task))).is_ok() {
                self.pending += 1;
            } else {
                warn!(worker = id, "search thread is gone");
            }
        }
        self.done = Some(done_rx);
        debug!(workers = self.pending, depth, "search started");
    }

    /// Block until every worker has finished, then return the primary's
    /// result with the pool's node total. `None` if no search was running.
    pub fn wait(&mut self) -> Option<SearchResult> {
        if let Some(done) = &self.done {
            while self.pending > 0 {
                let Ok(finished) = done.recv() else {
                    warn!(missing = self.pending, "search threads exited without reporting");
                    break;
                };
                self.pending -= 1;
                if finished.result.is_some() {
                    self.result = finished.result;
                }
            }
        }
        self.pending = 0;
        self.done = None;
        let total = self.nodes();
        self.result.take().map(|mut result| {
            result.nodes = total;
            result
        })
    }

    /// Nodes searched so far by all workers.
    pub fn nodes(&self) -> u64 {
        self.counters.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    /// Make every worker forget its move ordering history.
    pub fn clear_history(&self) {
        for worker in &self.workers {
            let _ = worker.sender.send(Message::ClearHistory);
        }
    }
}

impl Drop for ThreadManager {
    fn drop(&mut self) {
        for worker in &self.workers {
            let _ = worker.sender.send(Message::Quit);
        }
        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    warn!("search thread panicked");
                }
            }
        }
        debug!("search threads joined");
    }
}

impl std::fmt::Debug for ThreadManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadManager")
            .field("workers", &self.workers.len())
            .field("pending", &self.pending)
            .finish()
    }
}

fn worker_loop(id: usize, receiver: Receiver<Message>) {
    let mut info = Box::new(SearchInfo::new());
    while let Ok(message) = receiver.recv() {
        match message {
            Message::Search(task) => run_task(id, &mut info, *task),
            Message::ClearHistory => info.clear_history(),
            Message::Quit => break,
        }
    }
}

fn run_task(id: usize, info: &mut SearchInfo, task: Task) {
    let Task {
        pos,
        tt,
        time,
        depth,
        counters,
        mut reporter,
        on_complete,
        done,
    } = task;

    let mut report = |r: &IterationReport| {
        if let Some(reporter) = reporter.as_mut() {
            reporter(r);
        }
    };
    let result = Search::new(pos, info, &tt, &time)
        .with_worker(id, &counters)
        .run(depth, &mut report);

    let result = if id == 0 {
        time.stop();
        let mut result = result;
        result.nodes = counters.iter().map(|c| c.load(Ordering::Relaxed)).sum();
        if let Some(on_complete) = on_complete {
            on_complete(&result);
        }
        Some(result)
    } else {
        None
    };
    // Release the shared table before reporting so the owner can resize it.
    drop(tt);
    let _ = done.send(Finished { result });
}
