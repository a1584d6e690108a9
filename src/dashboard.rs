use std::fmt;

use itertools::Itertools;

use crate::model;
use crate::scheduler;
use crate::settings;

const SPARKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub channel: Option<String>,
    pub loading: bool,
    pub last_update: Option<chrono::DateTime<chrono::Utc>>,
    pub refresh_sec: u64,
    /// Number of readings the cards and the chart are computed over.
    pub window: usize,
    pub current: Option<Current>,
    pub average: Option<u8>,
    pub low: Option<u8>,
    pub high: Option<u8>,
    pub thresholds: model::Thresholds,
    pub chart: Timeseries<u8>,
    /// Newest first.
    pub recent: Vec<model::Reading>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Current {
    pub value: u8,
    pub status: model::Status,
    pub advice: &'static str,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeseries<A> {
    pub timestamp: Vec<chrono::DateTime<chrono::Utc>>,
    pub label: Vec<String>,
    pub value: Vec<A>,
}

impl Dashboard {
    pub fn new(state: &scheduler::State, settings: &settings::Settings) -> Dashboard {
        let series = &*state.series;

        let current = series.latest().map(|reading| Current {
            value: reading.value,
            status: reading.status,
            advice: reading.status.advice(),
        });
        let average = series.average().map(|mean| mean.round() as u8);
        let (low, high) = match series.iter().map(|r| r.value).minmax().into_option() {
            Some((low, high)) => (Some(low), Some(high)),
            None => (None, None),
        };

        let mut chart = Timeseries::default();
        for reading in series {
            chart.timestamp.push(reading.timestamp);
            chart.label.push(clock_label(reading.timestamp));
            chart.value.push(reading.value);
        }

        let recent = series
            .iter()
            .rev()
            .take(settings.recent_rows())
            .cloned()
            .collect();

        Dashboard {
            channel: settings.channel.clone(),
            loading: state.loading,
            last_update: state.last_update,
            refresh_sec: settings.refresh_sec,
            window: series.len(),
            current,
            average,
            low,
            high,
            thresholds: settings.thresholds,
            chart,
            recent,
        }
    }

    pub fn to_json(&self) -> Result<String, failure::Error> {
        Ok(serde_json::to_string(self)?)
    }
}

/// `HH:MM` in local time, as used on the chart axis.
pub fn clock_label(timestamp: chrono::DateTime<chrono::Utc>) -> String {
    timestamp
        .with_timezone(&chrono::Local)
        .format("%H:%M")
        .to_string()
}

fn spark(value: u8) -> char {
    SPARKS[usize::from(value.min(100)) * (SPARKS.len() - 1) / 100]
}

fn percent(value: Option<u8>) -> String {
    value.map_or_else(|| "--".to_owned(), |v| format!("{}%", v))
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.channel {
            Some(ref channel) => writeln!(f, "Soil Moisture Monitor (channel {})", channel)?,
            None => writeln!(f, "Soil Moisture Monitor")?,
        }
        writeln!(f)?;

        match self.current {
            Some(ref current) => writeln!(
                f,
                "  Current moisture  {:>4}  {} - {}",
                format!("{}%", current.value),
                current.status,
                current.advice
            )?,
            None => writeln!(f, "  Current moisture  {:>4}", "--")?,
        }
        writeln!(
            f,
            "  Average moisture  {:>4}  last {} readings, range {} to {}",
            percent(self.average),
            self.window,
            percent(self.low),
            percent(self.high)
        )?;
        let last_update = self.last_update.map_or_else(
            || "--".to_owned(),
            |t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string(),
        );
        writeln!(
            f,
            "  Last update       {}  auto-refresh {}s{}",
            last_update,
            self.refresh_sec,
            if self.loading { ", refreshing" } else { "" }
        )?;
        writeln!(f)?;

        writeln!(f, "Moisture trends")?;
        if self.chart.value.is_empty() {
            let message = if self.loading {
                "Loading data..."
            } else {
                "No data available"
            };
            writeln!(f, "  {}", message)?;
        } else {
            let line = self.chart.value.iter().cloned().map(spark).collect::<String>();
            writeln!(f, "  {}", line)?;
            if let (Some(first), Some(last)) = (self.chart.label.first(), self.chart.label.last())
            {
                let gap = self.chart.value.len().saturating_sub(first.len() + last.len());
                writeln!(f, "  {}{}{}", first, " ".repeat(gap), last)?;
            }
        }
        writeln!(
            f,
            "  Dry (<{}%)  Normal ({}-{}%)  Wet (>{}%)",
            self.thresholds.dry, self.thresholds.dry, self.thresholds.wet, self.thresholds.wet
        )?;
        writeln!(f)?;

        writeln!(f, "Recent readings")?;
        writeln!(f, "  {:<19}  {:>8}  {}", "Timestamp", "Moisture", "Status")?;
        for reading in &self.recent {
            writeln!(
                f,
                "  {:<19}  {:>8}  {}",
                reading
                    .timestamp
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
                format!("{}%", reading.value),
                reading.status
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync;

    use chrono::TimeZone;

    fn series(values: &[u8]) -> model::Series {
        let start = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let thresholds = model::Thresholds::default();
        model::Series::new(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| {
                    model::Reading::new(
                        start + chrono::Duration::minutes(i as i64),
                        v,
                        &thresholds,
                    )
                })
                .collect(),
        )
    }

    fn state(values: &[u8]) -> scheduler::State {
        let series = series(values);
        let last_update = series.latest().map(|r| r.timestamp);
        scheduler::State {
            series: sync::Arc::new(series),
            loading: false,
            last_update,
            refreshes: 1,
        }
    }

    #[test]
    fn cards_summarize_the_window() {
        let dashboard = Dashboard::new(&state(&[20, 45, 51, 80]), &settings::Settings::default());

        let current = dashboard.current.as_ref().unwrap();
        assert_eq!(current.value, 80);
        assert_eq!(current.status, model::Status::Wet);
        assert_eq!(current.advice, "Sufficient");
        // 196 / 4 = 49
        assert_eq!(dashboard.average, Some(49));
        assert_eq!(dashboard.low, Some(20));
        assert_eq!(dashboard.high, Some(80));
        assert_eq!(dashboard.window, 4);
        assert_eq!(dashboard.chart.value, vec![20, 45, 51, 80]);
        assert_eq!(dashboard.chart.label.len(), 4);
        assert_eq!(
            dashboard.chart.label[0],
            clock_label(dashboard.chart.timestamp[0])
        );
    }

    #[test]
    fn average_rounds_to_nearest() {
        let dashboard = Dashboard::new(&state(&[10, 11]), &settings::Settings::default());
        assert_eq!(dashboard.average, Some(11));
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let values = (0..30).map(|v| v * 3).collect::<Vec<u8>>();
        let dashboard = Dashboard::new(&state(&values), &settings::Settings::default());

        assert_eq!(dashboard.recent.len(), 10);
        assert_eq!(dashboard.recent[0].value, 87);
        assert_eq!(dashboard.recent[9].value, 60);
        for pair in dashboard.recent.windows(2) {
            assert!(pair[0].timestamp > pair[1].timestamp);
        }
    }

    #[test]
    fn empty_state() {
        let dashboard = Dashboard::new(&scheduler::State::default(), &settings::Settings::default());

        assert!(dashboard.current.is_none());
        assert!(dashboard.average.is_none());
        assert!(dashboard.low.is_none());
        assert!(dashboard.recent.is_empty());

        let text = dashboard.to_string();
        assert!(text.contains("No data available"));
        assert!(text.contains("--"));
    }

    #[test]
    fn loading_without_data() {
        let mut state = scheduler::State::default();
        state.loading = true;
        let dashboard = Dashboard::new(&state, &settings::Settings::default());

        assert!(dashboard.to_string().contains("Loading data..."));
    }

    #[test]
    fn text_rendering() {
        let mut settings = settings::Settings::default();
        settings.channel = Some("3063379".to_owned());
        let dashboard = Dashboard::new(&state(&[0, 50, 100]), &settings);
        let text = dashboard.to_string();

        assert!(text.starts_with("Soil Moisture Monitor (channel 3063379)"));
        assert!(text.contains("100%  WET - Sufficient"));
        assert!(text.contains("▁▄█"));
        assert!(text.contains("Dry (<30%)  Normal (30-70%)  Wet (>70%)"));
        assert!(text.contains("auto-refresh 20s"));
    }

    #[test]
    fn json_uses_camel_case() {
        let dashboard = Dashboard::new(&state(&[25, 35]), &settings::Settings::default());
        let json: serde_json::Value = serde_json::from_str(&dashboard.to_json().unwrap()).unwrap();

        assert_eq!(json["current"]["status"], "NORMAL");
        assert_eq!(json["refreshSec"], 20);
        assert_eq!(json["recent"][0]["value"], 35);
        assert_eq!(json["recent"][1]["status"], "DRY");
        assert!(json["lastUpdate"].is_string());
        assert_eq!(json["chart"]["value"][0], 25);
    }

    #[test]
    fn sparks_cover_the_scale() {
        assert_eq!(spark(0), '▁');
        assert_eq!(spark(50), '▄');
        assert_eq!(spark(100), '█');
    }
}
