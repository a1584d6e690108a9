use std::time;

/// A named periodic timer whose first tick fires one `period` after creation.
pub struct Every {
    log: slog::Logger,
    interval: tokio::time::Interval,
}

pub fn every(log: &slog::Logger, name: &str, period: time::Duration) -> Every {
    let log = log.new(o!("timer" => name.to_owned()));
    debug!(log, "starting timer"; "period" => ?period);

    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    Every { log, interval }
}

impl Every {
    pub async fn tick(&mut self) {
        self.interval.tick().await;
        debug!(self.log, "timer tick");
    }
}
