use std::env::var_os;
use std::ffi::OsStr;
use std::path::Path;
use log::debug;
use serde::{Deserialize, Serialize};
use multibutton::{ButtonResult, MultiButton};

/// Timing overrides read from a JSON file. Missing fields keep the driver defaults.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Timings {
    pub debounce_threshold: Option<u32>,
    pub interval_us: Option<u32>,
    pub short_press_us: Option<u32>,
    pub long_press_us: Option<u32>,
    pub multi_click_gap_us: Option<u32>,
    pub idle_timeout_us: Option<u32>,
    pub scan_period_us: Option<u32>,
}

impl Timings {
    /// Loads the file named by `CONFIG_FILE`, or `multibutton.json`, if it exists.
    pub fn try_load() -> eyre::Result<Option<Self>> {
        let config_str = var_os("CONFIG_FILE");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("multibutton.json"));
        let config_path = Path::new(config_str);
        if !config_path.exists() {
            return Ok(None);
        }

        let file = std::fs::File::open(config_path)?;
        let reader = std::io::BufReader::new(file);
        Ok(Some(serde_json::from_reader(reader)?))
    }

    /// Applies every given value through the handle's setters.
    pub fn apply(&self, buttons: &mut MultiButton) -> ButtonResult<()> {
        if let Some(count) = self.debounce_threshold {
            buttons.set_debounce_threshold(count)?;
        }
        if let Some(us) = self.interval_us {
            buttons.set_interval_us(us)?;
        }
        if let Some(us) = self.short_press_us {
            buttons.set_short_press_us(us)?;
        }
        if let Some(us) = self.long_press_us {
            buttons.set_long_press_us(us)?;
        }
        if let Some(us) = self.multi_click_gap_us {
            buttons.set_multi_click_gap_us(us)?;
        }
        if let Some(us) = self.idle_timeout_us {
            buttons.set_idle_timeout_us(us)?;
        }
        if let Some(us) = self.scan_period_us {
            buttons.set_scan_period_us(us)?;
        }
        debug!("Applied {:?}.", self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multibutton::sim::{EventLog, SimClock, SimMatrix};
    use multibutton::Config;

    #[test]
    fn partial_file_only_overrides_given_fields() {
        let timings: Timings =
            serde_json::from_str(r#"{ "long_press_us": 2000000, "scan_period_us": 10000 }"#).unwrap();
        assert_eq!(timings.long_press_us, Some(2_000_000));
        assert_eq!(timings.short_press_us, None);

        let (matrix, _) = SimMatrix::new(1, 1);
        let mut buttons = MultiButton::builder()
            .matrix(matrix)
            .clock(SimClock::default())
            .event_sink(EventLog::new())
            .build()
            .unwrap();
        buttons.init(1, 1).unwrap();
        timings.apply(&mut buttons).unwrap();

        let expected = Config {
            long_press_us: 2_000_000,
            scan_period_us: 10_000,
            ..Config::default()
        };
        assert_eq!(buttons.config(), Ok(expected));
    }
}
