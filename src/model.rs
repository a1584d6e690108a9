use std::fmt;
use std::slice;

/// A moisture value below this is dry.
pub const DRY_BELOW: f64 = 30.0;
/// A moisture value above this is wet.
pub const WET_ABOVE: f64 = 70.0;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Dry,
    Normal,
    Wet,
}

impl Status {
    pub fn advice(self) -> &'static str {
        match self {
            Status::Dry => "Irrigation needed",
            Status::Normal => "OK",
            Status::Wet => "Sufficient",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(match *self {
            Status::Dry => "DRY",
            Status::Normal => "NORMAL",
            Status::Wet => "WET",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Thresholds {
    /// Values strictly below this are `DRY`.
    #[serde(deserialize_with = "crate::settings::deserialize_percentage")]
    pub dry: f64,
    /// Values strictly above this are `WET`.
    #[serde(deserialize_with = "crate::settings::deserialize_percentage")]
    pub wet: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            dry: DRY_BELOW,
            wet: WET_ABOVE,
        }
    }
}

impl Thresholds {
    /// Both bounds are exclusive, so a value sitting exactly on a threshold is `NORMAL`.
    pub fn classify(&self, value: f64) -> Status {
        if value < self.dry {
            Status::Dry
        } else if value > self.wet {
            Status::Wet
        } else {
            Status::Normal
        }
    }
}

/// Classifies with the default thresholds.
pub fn classify(value: f64) -> Status {
    Thresholds::default().classify(value)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Moisture in percent, `0..=100`.
    pub value: u8,
    pub status: Status,
}

impl Reading {
    pub fn new(
        timestamp: chrono::DateTime<chrono::Utc>,
        value: u8,
        thresholds: &Thresholds,
    ) -> Self {
        let value = value.min(100);
        Reading {
            timestamp,
            value,
            status: thresholds.classify(f64::from(value)),
        }
    }
}

/// The display window: readings ordered oldest first.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Series {
    readings: Vec<Reading>,
}

impl Series {
    pub fn new(readings: Vec<Reading>) -> Self {
        debug_assert!(readings
            .windows(2)
            .all(|w| w[0].timestamp < w[1].timestamp));
        Series { readings }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn iter(&self) -> slice::Iter<Reading> {
        self.readings.iter()
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.readings.last()
    }

    pub fn average(&self) -> Option<f64> {
        if self.readings.is_empty() {
            return None;
        }
        let sum: u32 = self.readings.iter().map(|r| u32::from(r.value)).sum();
        Some(f64::from(sum) / self.readings.len() as f64)
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Reading;
    type IntoIter = slice::Iter<'a, Reading>;

    fn into_iter(self) -> Self::IntoIter {
        self.readings.iter()
    }
}
