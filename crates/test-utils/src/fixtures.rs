//! Common test fixtures for radar loop tests.
//!
//! This module provides pre-defined test data that represents common
//! scenarios in radar acquisition and compositing.

/// Observer positions used across the test suite.
pub mod positions {
    use radar_common::GeoPosition;

    /// Southern edge of the supported region
    pub const MIN_LAT: f64 = 20.0;
    /// Northern edge of the supported region
    pub const MAX_LAT: f64 = 52.0;
    /// Western edge of the supported region
    pub const MIN_LON: f64 = -130.0;
    /// Eastern edge of the supported region
    pub const MAX_LON: f64 = -60.0;

    pub fn kansas_city() -> GeoPosition {
        GeoPosition::new(39.0997, -94.5786, "MO")
    }

    pub fn seattle() -> GeoPosition {
        GeoPosition::new(47.6062, -122.3321, "WA")
    }

    pub fn miami() -> GeoPosition {
        GeoPosition::new(25.7617, -80.1918, "FL")
    }

    pub fn anchorage() -> GeoPosition {
        GeoPosition::new(61.2181, -149.9003, "AK")
    }

    pub fn honolulu() -> GeoPosition {
        GeoPosition::new(21.3069, -157.8583, "HI")
    }

    /// The four corners of the supported bounding box.
    pub fn corners() -> Vec<GeoPosition> {
        vec![
            GeoPosition::new(MAX_LAT, MIN_LON, "WA"),
            GeoPosition::new(MAX_LAT, MAX_LON, "ME"),
            GeoPosition::new(MIN_LAT, MIN_LON, "CA"),
            GeoPosition::new(MIN_LAT, MAX_LON, "FL"),
        ]
    }
}

/// Archive listing fixtures.
pub mod listing {
    /// Listing URL for 2024-01-14.
    pub const YESTERDAY_URL: &str =
        "https://mesonet.agron.iastate.edu/archive/data/2024/01/14/GIS/uscomp/";

    /// Listing URL for 2024-01-15.
    pub const TODAY_URL: &str =
        "https://mesonet.agron.iastate.edu/archive/data/2024/01/15/GIS/uscomp/";

    /// Mosaic filenames for one day, five minutes apart starting at `hour`.
    pub fn mosaic_names(day: &str, hour: u32, count: u32) -> Vec<String> {
        (0..count)
            .map(|i| {
                let minutes = hour * 60 + i * 5;
                format!("n0r_{}{:02}{:02}.png", day, minutes / 60, minutes % 60)
            })
            .collect()
    }

    /// Apache-style directory index linking the given entries.
    ///
    /// Also links a world file and a non-reflectivity product so filters
    /// have something to reject.
    pub fn directory_index(entries: &[String]) -> String {
        let mut html = String::from(
            "<html><head><title>Index of /archive/data/GIS/uscomp</title></head>\n<body>\n<h1>Index</h1>\n<pre>\n",
        );
        html.push_str("<a href=\"../\">Parent Directory</a>\n");
        for entry in entries {
            html.push_str(&format!(
                "<a href=\"{entry}\">{entry}</a>    15-Jan-2024 12:40  412K\n"
            ));
            html.push_str(&format!(
                "<a href=\"{0}\">{0}</a>    15-Jan-2024 12:40  1K\n",
                entry.replace(".png", ".wld")
            ));
        }
        html.push_str("<a href=\"n1p_202401151200.png\">n1p_202401151200.png</a>\n");
        html.push_str("</pre>\n</body></html>\n");
        html
    }
}

/// Common time values for testing.
pub mod time {
    use chrono::{DateTime, TimeZone, Utc};

    /// A fixed "now" for tests (2024-01-15T13:00:00Z)
    pub fn reference_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 13, 0, 0).unwrap()
    }

    /// Last-Modified header value matching `reference_now` minus 20 minutes.
    pub const LAST_MODIFIED: &str = "Mon, 15 Jan 2024 12:40:00 GMT";
}
