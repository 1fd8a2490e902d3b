//! Worker threads for blocking record store reads.

use crossbeam_channel as chan;
use std::io;
use std::sync::Arc;
use std::thread;

/// Handle for a pool of workers draining a command queue.
///
/// Results are not stored here: handlers send them wherever the owner wants
/// them, usually the owner's inbox. Dropping the handle closes the queue and
/// the workers exit once it is drained.
pub struct AsyncLoader<Cmd> {
    cmd_tx: Option<chan::Sender<Cmd>>,
}

impl<Cmd> AsyncLoader<Cmd>
where
    Cmd: Send + 'static,
{
    /// Create an uninitialized loader handle.
    pub fn new() -> Self {
        Self { cmd_tx: None }
    }

    /// Start the workers if they have not been started yet. Returns false
    /// when they were already running.
    pub fn start<Ctx, Msg>(
        &mut self,
        ctx: Ctx,
        msg_tx: chan::Sender<Msg>,
        workers: usize,
        worker_name: &str,
        handler: impl Fn(Cmd, &Ctx, &chan::Sender<Msg>) + Send + Sync + 'static,
    ) -> io::Result<bool>
    where
        Ctx: Clone + Send + 'static,
        Msg: Send + 'static,
    {
        if self.cmd_tx.is_some() {
            return Ok(false);
        }

        let (cmd_tx, cmd_rx) = chan::unbounded::<Cmd>();

        let handler = Arc::new(handler);
        let workers = workers.max(1);
        for idx in 0..workers {
            let cmd_rx = cmd_rx.clone();
            let msg_tx = msg_tx.clone();
            let ctx = ctx.clone();
            let handler = handler.clone();
            let name = if workers == 1 {
                worker_name.to_string()
            } else {
                format!("{worker_name}-{idx}")
            };

            thread::Builder::new().name(name).spawn(move || {
                while let Ok(cmd) = cmd_rx.recv() {
                    (handler)(cmd, &ctx, &msg_tx);
                }
            })?;
        }

        self.cmd_tx = Some(cmd_tx);
        Ok(true)
    }

    pub fn is_started(&self) -> bool {
        self.cmd_tx.is_some()
    }

    /// Queue a command. False when the workers aren't running.
    pub fn send(&self, cmd: Cmd) -> bool {
        let Some(tx) = &self.cmd_tx else {
            return false;
        };

        tx.send(cmd).is_ok()
    }
}

impl<Cmd> Default for AsyncLoader<Cmd>
where
    Cmd: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Compute a worker count based on available parallelism, clamped to a max.
pub fn worker_count(max_workers: usize) -> usize {
    let available = thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(1);
    let max_workers = max_workers.max(1);
    available.clamp(1, max_workers)
}
