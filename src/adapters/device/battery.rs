use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::application::ports::BatteryPort;
use crate::domain::battery::BatteryReading;

pub const POWER_SUPPLY_DIR: &str = "/sys/class/power_supply";

/// Lee la primera batería de `/sys/class/power_supply`.
pub struct SysfsBattery {
    root: PathBuf,
}

impl SysfsBattery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn find_battery(&self) -> Option<PathBuf> {
        let mut supplies: Vec<PathBuf> = fs::read_dir(&self.root).ok()?.flatten().map(|e| e.path()).collect();
        supplies.sort();
        supplies.into_iter().find(|p| read_trimmed(&p.join("type")).as_deref() == Some("Battery"))
    }
}

impl Default for SysfsBattery {
    fn default() -> Self {
        Self::new(POWER_SUPPLY_DIR)
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

impl BatteryPort for SysfsBattery {
    fn read(&self) -> Option<BatteryReading> {
        let dir = self.find_battery()?;
        let capacity: f32 = read_trimmed(&dir.join("capacity"))?.parse().ok()?;
        let status = read_trimmed(&dir.join("status")).unwrap_or_default();
        let reading = BatteryReading {
            level: (capacity / 100.0).clamp(0.0, 1.0),
            charging: matches!(status.as_str(), "Charging" | "Full"),
        };
        debug!("🔋 {:?}", reading);
        Some(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supply(root: &Path, name: &str, kind: &str, capacity: &str, status: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("type"), format!("{kind}\n")).unwrap();
        fs::write(dir.join("capacity"), format!("{capacity}\n")).unwrap();
        fs::write(dir.join("status"), format!("{status}\n")).unwrap();
    }

    #[test]
    fn reads_the_battery_and_ignores_mains() {
        let root = tempfile::tempdir().unwrap();
        supply(root.path(), "AC", "Mains", "0", "Unknown");
        supply(root.path(), "BAT0", "Battery", "42", "Discharging");

        let reading = SysfsBattery::new(root.path()).read().unwrap();
        assert!((reading.level - 0.42).abs() < 1e-6);
        assert!(!reading.charging);
    }

    #[test]
    fn charging_status_is_reported() {
        let root = tempfile::tempdir().unwrap();
        supply(root.path(), "BAT1", "Battery", "80", "Charging");
        assert!(SysfsBattery::new(root.path()).read().unwrap().charging);
    }

    #[test]
    fn no_battery_means_no_reading() {
        let root = tempfile::tempdir().unwrap();
        supply(root.path(), "AC", "Mains", "0", "Unknown");
        assert!(SysfsBattery::new(root.path()).read().is_none());
        assert!(SysfsBattery::new(root.path().join("missing")).read().is_none());
    }
}
