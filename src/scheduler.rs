use std::sync;
use std::time;

use tokio::sync::oneshot;
use tokio::sync::watch;

use crate::clock;
use crate::generator;
use crate::model;
use crate::util;

/// What the presentation layer sees. Replaced as a whole on every refresh.
#[derive(Clone, Debug, Default)]
pub struct State {
    pub series: sync::Arc<model::Series>,
    pub loading: bool,
    pub last_update: Option<chrono::DateTime<chrono::Utc>>,
    /// Successful refreshes so far, the startup one included.
    pub refreshes: u64,
}

/// Owns a running refresh loop. Dropping it cancels the loop.
pub struct Handle {
    log: slog::Logger,
    state: watch::Receiver<State>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

struct Refresher<S> {
    log: slog::Logger,
    source: S,
    clock: sync::Arc<dyn clock::Clock>,
    state: watch::Sender<State>,
}

/// Refreshes once before returning, then every `period` on a spawned task.
///
/// Must be called from within a tokio runtime.
pub fn start<S>(
    log: &slog::Logger,
    source: S,
    clock: sync::Arc<dyn clock::Clock>,
    period: time::Duration,
) -> Handle
where
    S: generator::Source,
{
    let log = log.new(o!("component" => "scheduler"));
    let (state_tx, state_rx) = watch::channel(State {
        loading: true,
        ..State::default()
    });

    let mut refresher = Refresher {
        log: log.clone(),
        source,
        clock,
        state: state_tx,
    };
    refresher.refresh();

    let timer = util::every(&log, "refresh", period);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(refresher.run(timer, shutdown_rx));

    Handle {
        log,
        state: state_rx,
        shutdown: Some(shutdown_tx),
        task: Some(task),
    }
}

/// Fetches a single series without arming any timer.
pub fn snapshot<S>(source: &mut S, clock: &dyn clock::Clock) -> Result<State, failure::Error>
where
    S: generator::Source,
{
    let series = source.fetch(clock.now())?;
    Ok(State {
        series: sync::Arc::new(series),
        loading: false,
        last_update: Some(clock.now()),
        refreshes: 1,
    })
}

impl Handle {
    pub fn state(&self) -> State {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<State> {
        self.state.clone()
    }

    /// Cancels the timer and waits until the refresh task has exited.
    pub async fn stop(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(self.log, "refresh task did not shut down cleanly"; "error" => %e);
            }
        }
    }

    fn cancel(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            // The task may already be gone; nothing to cancel then.
            let _ = shutdown.send(());
        }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<S> Refresher<S>
where
    S: generator::Source,
{
    async fn run(mut self, mut timer: util::Every, mut shutdown: oneshot::Receiver<()>) {
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = timer.tick() => self.refresh(),
            }
        }
        debug!(self.log, "refresh loop stopped");
    }

    fn refresh(&mut self) {
        self.state.send_modify(|state| state.loading = true);

        match self.source.fetch(self.clock.now()) {
            Ok(series) => {
                let last_update = self.clock.now();
                if let Some(latest) = series.latest() {
                    info!(self.log, "refreshed readings";
                          "current" => latest.value,
                          "status" => %latest.status,
                          "readings" => series.len());
                }
                let series = sync::Arc::new(series);
                self.state.send_modify(move |state| {
                    state.series = series;
                    state.last_update = Some(last_update);
                    state.loading = false;
                    state.refreshes += 1;
                });
            }
            Err(e) => {
                warn!(self.log, "refresh failed, keeping previous readings"; "error" => %e);
                self.state.send_modify(|state| state.loading = false);
            }
        }
    }
}
