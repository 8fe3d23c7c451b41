//! RGB color light and the infrared remote vocabulary that drives it.

use serde::{Deserialize, Serialize};

/// Color applied before anyone picks one.
pub const DEFAULT_COLOR: &str = "#ffffff";

/// On/off state plus the current color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorLight {
    pub on: bool,
    pub color: String,
}

impl Default for ColorLight {
    fn default() -> Self {
        Self {
            on: false,
            color: DEFAULT_COLOR.to_string(),
        }
    }
}

impl ColorLight {
    /// Apply only the provided fields. An empty color is ignored.
    pub fn apply(&mut self, on: Option<bool>, color: Option<&str>) {
        if let Some(on) = on {
            self.on = on;
        }
        if let Some(color) = color.map(str::trim).filter(|c| !c.is_empty()) {
            self.color = color.to_string();
        }
    }

    pub fn toggle(&mut self) {
        self.on = !self.on;
    }

    /// Execute a remote command.
    pub fn handle(&mut self, command: &RemoteCommand) {
        match command {
            RemoteCommand::On { color } => self.apply(Some(true), color.as_deref()),
            RemoteCommand::Off => self.apply(Some(false), None),
            RemoteCommand::Toggle => self.toggle(),
        }
    }
}

/// A decoded infrared remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCommand {
    /// Switch on, optionally changing color.
    On { color: Option<String> },
    Off,
    Toggle,
}

impl RemoteCommand {
    /// Decode a bare string command or a `{command, color}` object.
    ///
    /// Commands are case-insensitive. `color:<c>` switches on with color
    /// `<c>`; an object without a known command but with a non-empty
    /// `color` does the same. Anything else yields `None`.
    #[must_use]
    pub fn decode(value: &serde_json::Value) -> Option<Self> {
        let (command, color) = match value {
            serde_json::Value::String(s) => (s.as_str(), None),
            serde_json::Value::Object(map) => (
                map.get("command")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default(),
                map.get("color").and_then(serde_json::Value::as_str),
            ),
            _ => return None,
        };
        let command = command.trim().to_ascii_lowercase();

        match command.as_str() {
            "on" | "power_on" => Some(Self::On { color: None }),
            "off" | "power_off" => Some(Self::Off),
            "toggle" | "power" => Some(Self::Toggle),
            other => {
                if let Some(picked) = other.strip_prefix("color:") {
                    return Some(Self::On {
                        color: non_empty(picked),
                    });
                }
                color
                    .and_then(non_empty)
                    .map(|color| Self::On { color: Some(color) })
            }
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
