//! Cancellable periodic trigger.
//!
//! The ticker thread never touches animation state; it only posts empty
//! ticks that the owner drains on its own thread.

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, unbounded, Receiver, Sender, TryRecvError};
use tracing::{debug, warn};

pub struct CycleTimer {
    interval: Duration,
    ticks: Receiver<()>,
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl CycleTimer {
    pub fn start(interval: Duration) -> std::io::Result<Self> {
        let (tick_tx, tick_rx) = unbounded::<()>();
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let worker = std::thread::Builder::new()
            .name("cycle-timer".into())
            .spawn(move || run_ticker(interval, tick_tx, stop_rx))?;
        debug!("cycle timer started at {:?}", interval);

        Ok(Self {
            interval,
            ticks: tick_rx,
            stop: Some(stop_tx),
            worker: Some(worker),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_active(&self) -> bool {
        self.stop.is_some()
    }

    /// Number of ticks delivered since the last drain. Never blocks.
    pub fn drain(&self) -> u32 {
        let mut count = 0;
        loop {
            match self.ticks.try_recv() {
                Ok(_) => count += 1,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return count,
            }
        }
    }

    /// Blocks until the next tick or `timeout`. Returns `false` on timeout
    /// or once the timer has been cancelled.
    pub fn wait(&self, timeout: Duration) -> bool {
        self.is_active() && self.ticks.recv_timeout(timeout).is_ok()
    }

    /// Stops and joins the ticker. Returns `true` only for the call that
    /// actually released it.
    pub fn cancel(&mut self) -> bool {
        let Some(stop) = self.stop.take() else {
            return false;
        };
        // The worker may already be gone if its receiver side errored out.
        let _ = stop.send(());
        drop(stop);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("cycle timer thread panicked");
            }
        }
        // Ticks queued before the stop are stale now.
        while self.ticks.try_recv().is_ok() {}
        debug!("cycle timer cancelled");
        true
    }

    /// Second handle on the tick channel; it disconnects once the ticker
    /// thread has exited.
    #[cfg(test)]
    pub(crate) fn tick_receiver(&self) -> Receiver<()> {
        self.ticks.clone()
    }
}

impl Drop for CycleTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn run_ticker(interval: Duration, ticks: Sender<()>, stop: Receiver<()>) {
    let ticker = tick(interval);
    loop {
        select! {
            recv(ticker) -> msg => {
                if msg.is_err() || ticks.send(()).is_err() {
                    return;
                }
            }
            // A message or a disconnect both mean stop.
            recv(stop) -> _ => return,
        }
    }
}
