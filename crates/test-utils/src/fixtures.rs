//! Common test fixtures for AOD pipeline tests.

/// Fill value used by MCD19A2 optical depth layers.
pub const MODIS_FILL_VALUE: f64 = -28672.0;

/// Common bounding box definitions as (min_x, min_y, max_x, max_y).
pub mod bbox {
    /// Global bounding box (-180 to 180, -90 to 90)
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// California, the default acquisition extent
    pub const CALIFORNIA: (f64, f64, f64, f64) = (-125.0, 32.0, -114.0, 42.0);

    /// A small test extent
    pub const SMALL: (f64, f64, f64, f64) = (-120.0, 36.0, -119.0, 37.0);
}

/// MODIS sinusoidal tile grid constants.
pub mod modis {
    /// Western edge of the projected world (meters)
    pub const WORLD_MIN_X: f64 = -20_015_109.354;

    /// Northern edge of the projected world (meters)
    pub const WORLD_MAX_Y: f64 = 10_007_554.677;

    /// Width and height of one 10° tile (meters)
    pub const TILE_SIZE: f64 = 1_111_950.519_666_7;

    /// Pixels along one side of a 1 km tile
    pub const TILE_PIXELS: usize = 1200;

    /// Upper-left corner of tile `(h, v)` in sinusoidal meters.
    pub fn tile_origin(h: u32, v: u32) -> (f64, f64) {
        (
            WORLD_MIN_X + h as f64 * TILE_SIZE,
            WORLD_MAX_Y - v as f64 * TILE_SIZE,
        )
    }
}

/// Common granule file names.
pub mod granules {
    /// Two tiles on 2024-01-15 (day 015) and one on 2024-01-16.
    pub const NAMES: [&str; 3] = [
        "MCD19A2.A2024015.h08v05.061.2024017010203.tif",
        "MCD19A2.A2024015.h09v05.061.2024017010204.tif",
        "MCD19A2.A2024016.h08v05.061.2024018004512.tif",
    ];
}

/// GeoJSON region fixtures.
pub mod regions {
    /// Two unit squares side by side: "west" covers x in [0, 1], "east" x in [10, 11].
    pub const TWO_SQUARES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"GEOID": "west", "NAME": "West County"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": {"GEOID": "east", "NAME": "East County"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [10.0, 0.0], [11.0, 0.0], [11.0, 1.0], [10.0, 1.0], [10.0, 0.0]
                    ]]
                }
            }
        ]
    }"#;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_california_is_valid() {
        let (min_x, min_y, max_x, max_y) = bbox::CALIFORNIA;
        assert!(min_x < max_x);
        assert!(min_y < max_y);
    }

    #[test]
    fn test_tile_origin() {
        let (x, y) = modis::tile_origin(18, 9);
        // Tile h18v09 starts at the equator on the prime meridian.
        assert!(x.abs() < 1.0, "x = {}", x);
        assert!(y.abs() < 1.0, "y = {}", y);
    }

    #[test]
    fn test_granule_names_carry_dates() {
        assert!(granules::NAMES.iter().all(|n| n.contains(".A2024")));
    }
}
