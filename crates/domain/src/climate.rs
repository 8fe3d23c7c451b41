//! Latest climate readings and the rotating text display.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::sensor::ClimateSensor;
use crate::time::Timestamp;

/// Shown when no climate sensor has reported yet.
pub const NO_DATA_TEXT: &str = "No DHT data";

/// Last reading of one climate sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClimateReading {
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub updated_at: Timestamp,
}

impl ClimateReading {
    /// Single-line display text, e.g. `DHT1 T:21.5C H:40.0%`.
    #[must_use]
    pub fn display_text(&self, sensor: ClimateSensor) -> String {
        format!(
            "{sensor} T:{}C H:{}%",
            format_value(self.temperature_c),
            format_value(self.humidity_pct)
        )
    }
}

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "--".to_string(), |v| format!("{v:.1}"))
}

/// Readings per sensor plus the round-robin display cursor.
#[derive(Debug, Default, Clone)]
pub struct ClimateBoard {
    readings: BTreeMap<ClimateSensor, ClimateReading>,
    cursor: usize,
    display_text: Option<String>,
}

impl ClimateBoard {
    /// Replace the reading of `sensor`.
    pub fn record(
        &mut self,
        sensor: ClimateSensor,
        temperature_c: Option<f64>,
        humidity_pct: Option<f64>,
        now: Timestamp,
    ) {
        self.readings.insert(
            sensor,
            ClimateReading {
                temperature_c,
                humidity_pct,
                updated_at: now,
            },
        );
    }

    #[must_use]
    pub fn readings(&self) -> &BTreeMap<ClimateSensor, ClimateReading> {
        &self.readings
    }

    /// Text produced by the last rotation.
    #[must_use]
    pub fn display_text(&self) -> &str {
        self.display_text.as_deref().unwrap_or(NO_DATA_TEXT)
    }

    /// Advance to the next sensor with a reading and return its text.
    ///
    /// The cursor does not move while no sensor has data.
    pub fn rotate(&mut self) -> String {
        let available: Vec<(ClimateSensor, ClimateReading)> =
            self.readings.iter().map(|(s, r)| (*s, *r)).collect();
        let text = if available.is_empty() {
            NO_DATA_TEXT.to_string()
        } else {
            let (sensor, reading) = available[self.cursor % available.len()];
            self.cursor = self.cursor.wrapping_add(1);
            reading.display_text(sensor)
        };
        self.display_text = Some(text.clone());
        text
    }
}
