use rand::distributions::Distribution;
use rand::Rng;
use rand::SeedableRng;

use crate::model;
use crate::settings;

/// Smallest moisture bump of a simulated rain shower, in percent.
const RAIN_MIN: f64 = 10.0;
/// Largest moisture bump of a simulated rain shower, in percent.
const RAIN_MAX: f64 = 25.0;

/// Anything that can produce the series to display at a given instant.
pub trait Source: Send + 'static {
    fn fetch(
        &mut self,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<model::Series, failure::Error>;
}

/// Synthesizes a smooth-plus-noise moisture signal.
///
/// Sample `i` of a series is `baseline + amplitude * sin(i / wavelength)` plus uniform noise of
/// the configured peak-to-peak width, clamped to `0..=100` and rounded to a whole percentage.
/// The newest sample is stamped `now` and each older one is `spacing` earlier.
pub struct Generator<R = rand::rngs::StdRng> {
    results: usize,
    spacing_sec: i64,
    signal: settings::Signal,
    thresholds: model::Thresholds,
    noise: rand::distributions::Uniform<f64>,
    rain: rand::distributions::Uniform<f64>,
    rng: R,
}

impl Generator {
    /// Seeds from `settings.seed` when present, otherwise from OS entropy.
    pub fn new(settings: &settings::Settings) -> Self {
        let rng = match settings.seed {
            Some(seed) => rand::rngs::StdRng::seed_from_u64(seed),
            None => rand::rngs::StdRng::from_entropy(),
        };
        Generator::with_rng(settings, rng)
    }
}

impl<R> Generator<R>
where
    R: Rng,
{
    pub fn with_rng(settings: &settings::Settings, rng: R) -> Self {
        let half_width = settings.signal.noise / 2.0;

        Generator {
            results: settings.results,
            spacing_sec: settings.spacing_sec,
            signal: settings.signal,
            thresholds: settings.thresholds,
            noise: rand::distributions::Uniform::new_inclusive(-half_width, half_width),
            rain: rand::distributions::Uniform::new_inclusive(RAIN_MIN, RAIN_MAX),
            rng,
        }
    }

    /// The newest reading is stamped exactly `now`, not one spacing before it.
    ///
    /// Expects settings that passed `Settings::validate`, which bounds the covered time span.
    pub fn generate(&mut self, now: chrono::DateTime<chrono::Utc>) -> model::Series {
        let mut readings = Vec::with_capacity(self.results);

        for i in 0..self.results {
            let age = (self.results - 1 - i) as i64;
            let timestamp = now - chrono::Duration::seconds(self.spacing_sec * age);
            let value = self.sample(i);
            readings.push(model::Reading::new(timestamp, value, &self.thresholds));
        }

        model::Series::new(readings)
    }

    fn sample(&mut self, i: usize) -> u8 {
        let phase = i as f64 / self.signal.wavelength;
        let mut value = self.signal.baseline
            + self.signal.amplitude * phase.sin()
            + self.noise.sample(&mut self.rng);

        // Disabled rain leaves the RNG stream untouched.
        if self.signal.rain_probability > 0.0 && self.rng.gen_bool(self.signal.rain_probability) {
            value += self.rain.sample(&mut self.rng);
        }

        value.max(0.0).min(100.0).round() as u8
    }
}

impl<R> Source for Generator<R>
where
    R: Rng + Send + 'static,
{
    fn fetch(
        &mut self,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<model::Series, failure::Error> {
        Ok(self.generate(now))
    }
}
