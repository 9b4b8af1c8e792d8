use chrono::NaiveDate;

/// Configuration constants for the application
pub struct Config;

impl Config {
    /// Base URL of the DirtyWatts public API
    pub const API_BASE_URL: &'static str = "https://api.dirtywatts.nz";

    /// Length of the historical query window (5 days = 432,000,000ms)
    pub const HISTORY_WINDOW_MS: i64 = 5 * 24 * 3600 * 1000;

    /// Sampling interval requested for power station history
    pub const POWER_STATIONS_INTERVAL_MINUTES: u32 = 60;

    /// Sampling interval requested for grid connection point history
    pub const CONNECTION_POINTS_INTERVAL_MINUTES: u32 = 30;

    /// Path on the local server that mirrors the preview datapoint
    pub const SYNC_PATH: &'static str = "/live/power_stations";

    /// localStorage key holding the selected calendar date
    pub const CALENDAR_DATE_STORAGE_KEY: &'static str = "calendar_date";

    /// Calendar date selected before the user picks one
    pub const DEFAULT_CALENDAR_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2023, 6, 28) {
        Some(date) => date,
        None => panic!("invalid default calendar date"),
    };
}
