//! Common test fixtures for tract-tiles tests.

/// Attribute names used by the census extracts.
pub mod attrs {
    pub const DIVERSITY: &str = "diversity";
    pub const INTEGRATION: &str = "integration";
    pub const TOTAL_POPULATION: &str = "B03002_001E";
    pub const GEOID: &str = "GEOID";
}

/// Common bounding boxes as (min_lon, min_lat, max_lon, max_lat).
pub mod bbox {
    /// Lower Manhattan, a handful of tracts at zoom 7
    pub const MANHATTAN: (f64, f64, f64, f64) = (-74.02, 40.70, -73.97, 40.75);
}

/// Tile addresses used across tests.
pub mod tiles {
    /// Zoom-7 tile containing New York City.
    pub const NYC_Z7: (u32, u32, u32) = (7, 37, 48);

    /// Out of range at zoom 5.
    pub const INVALID_Z5: (u32, u32, u32) = (5, 32, 0);
}

/// Color ramp names.
pub mod ramps {
    pub const DEFAULT: &str = "Greens";
    pub const HOT: &str = "hot";
    pub const DISCRETE: &str = "tab10";
}

/// Neutral gray used for zero-population tracts.
pub const ZERO_POPULATION_RGB: [u8; 3] = [0xC0, 0xC0, 0xC0];
