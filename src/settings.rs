use std::time;

use crate::model;

/// Prefix of environment variables overriding the file, e.g. `SOILWATCH_REFRESH_SEC`.
pub const ENV_PREFIX: &str = "SOILWATCH";

const MIN_RECENT: usize = 5;
const MAX_RECENT: usize = 200;
const MAX_RESULTS: usize = 10_000;
const MAX_REFRESH_SEC: u64 = 24 * 60 * 60;
/// Widest span a series may cover, oldest to newest reading: about a century.
const MAX_WINDOW_SEC: i64 = 100 * 365 * 24 * 60 * 60;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Telemetry channel label shown in the dashboard header. Never contacted.
    pub channel: Option<String>,
    /// Readings per generated series.
    pub results: usize,
    pub refresh_sec: u64,
    /// Nominal distance between two readings of a series.
    pub spacing_sec: i64,
    /// Rows in the recent-readings table.
    pub recent: usize,
    pub seed: Option<u64>,
    pub signal: Signal,
    pub thresholds: model::Thresholds,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Signal {
    pub baseline: f64,
    pub amplitude: f64,
    /// Index divisor of the sinusoid; larger is slower.
    pub wavelength: f64,
    /// Peak-to-peak width of the uniform noise.
    pub noise: f64,
    pub rain_probability: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            channel: None,
            results: 50,
            refresh_sec: 20,
            spacing_sec: 60,
            recent: 10,
            seed: None,
            signal: Signal::default(),
            thresholds: model::Thresholds::default(),
        }
    }
}

impl Default for Signal {
    fn default() -> Self {
        Signal {
            baseline: 45.0,
            amplitude: 20.0,
            wavelength: 10.0,
            noise: 10.0,
            rain_probability: 0.0,
        }
    }
}

impl Settings {
    /// Reads `name` (any format the `config` crate knows, optional) and then the environment.
    pub fn load(name: &str) -> Result<Self, failure::Error> {
        let settings: Settings = ::config::Config::builder()
            .add_source(::config::File::with_name(name).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), failure::Error> {
        if self.results == 0 || self.results > MAX_RESULTS {
            bail!(
                "results must be within 1..={}, got {}",
                MAX_RESULTS,
                self.results
            );
        }
        if self.refresh_sec == 0 || self.refresh_sec > MAX_REFRESH_SEC {
            bail!(
                "refresh_sec must be within 1..={}, got {}",
                MAX_REFRESH_SEC,
                self.refresh_sec
            );
        }
        if self.spacing_sec <= 0 || self.spacing_sec > MAX_WINDOW_SEC {
            bail!(
                "spacing_sec must be within 1..={}, got {}",
                MAX_WINDOW_SEC,
                self.spacing_sec
            );
        }
        let window = (self.results as i64 - 1).checked_mul(self.spacing_sec);
        if window.map_or(true, |window| window > MAX_WINDOW_SEC) {
            bail!(
                "{} readings spaced {}s apart span more than {}s",
                self.results,
                self.spacing_sec,
                MAX_WINDOW_SEC
            );
        }
        self.signal.validate()?;
        if self.thresholds.dry > self.thresholds.wet {
            bail!(
                "dry threshold {} is above wet threshold {}",
                self.thresholds.dry,
                self.thresholds.wet
            );
        }
        Ok(())
    }

    pub fn refresh_period(&self) -> time::Duration {
        time::Duration::from_secs(self.refresh_sec)
    }

    pub fn spacing(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.spacing_sec)
    }

    pub fn recent_rows(&self) -> usize {
        self.recent.max(MIN_RECENT).min(MAX_RECENT)
    }
}

impl Signal {
    fn validate(&self) -> Result<(), failure::Error> {
        for &(name, value) in &[("baseline", self.baseline), ("amplitude", self.amplitude)] {
            if !value.is_finite() {
                bail!("signal {} must be finite, got {}", name, value);
            }
        }
        if !(self.wavelength.is_finite() && self.wavelength > 0.0) {
            bail!("signal wavelength must be positive, got {}", self.wavelength);
        }
        if !(self.noise.is_finite() && self.noise >= 0.0) {
            bail!("signal noise must be non-negative, got {}", self.noise);
        }
        if !(0.0..=1.0).contains(&self.rain_probability) {
            bail!(
                "signal rain_probability must be within 0..=1, got {}",
                self.rain_probability
            );
        }
        Ok(())
    }
}

pub fn deserialize_percentage<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = <f64 as serde::Deserialize>::deserialize(deserializer)?;

    if (0.0..=100.0).contains(&raw) {
        Ok(raw)
    } else {
        Err(serde::de::Error::invalid_value(
            serde::de::Unexpected::Float(raw),
            &"a percentage between 0 and 100",
        ))
    }
}
