//! Metadata extraction from granule filenames.
//!
//! MODIS granule names follow
//! `<PRODUCT>.A<YYYYDDD>.h<HH>v<VV>.<COLLECTION>.<PRODUCTION>.<ext>`, e.g.
//! `MCD19A2.A2024015.h08v05.061.2024017010203.tif`.

use aod_common::DateKey;
use std::fmt;
use std::path::Path;

/// MODIS sinusoidal tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    /// Horizontal tile index (0-35)
    pub h: u8,
    /// Vertical tile index (0-17)
    pub v: u8,
}

impl TileId {
    /// Parse a `hHHvVV` token.
    pub fn parse(token: &str) -> Option<Self> {
        let rest = token.strip_prefix('h')?;
        let (h, v) = rest.split_once('v')?;
        if h.len() != 2 || v.len() != 2 {
            return None;
        }
        let h: u8 = h.parse().ok()?;
        let v: u8 = v.parse().ok()?;
        (h <= 35 && v <= 17).then_some(Self { h, v })
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{:02}v{:02}", self.h, self.v)
    }
}

/// Information extracted from a granule filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GranuleInfo {
    /// Product short name (e.g., "MCD19A2")
    pub product: String,
    /// Acquisition date
    pub date: DateKey,
    /// Tile, when the name carries one
    pub tile: Option<TileId>,
    /// Collection version (e.g., "061")
    pub collection: Option<String>,
}

/// Parse a granule filename.
///
/// Only the product and the `.AYYYYDDD.` date code are required; tile and
/// collection are filled in when present.
pub fn parse_granule_filename(file_path: &Path) -> Option<GranuleInfo> {
    let filename = file_path.file_name().and_then(|s| s.to_str())?;
    let date = DateKey::find_in_filename(filename)?;

    let mut parts = filename.split('.');
    let product = parts.next().filter(|p| !p.is_empty())?.to_string();
    let rest: Vec<&str> = parts.collect();

    let tile = rest.iter().find_map(|p| TileId::parse(p));
    let collection = rest
        .iter()
        .find(|p| p.len() == 3 && p.bytes().all(|b| b.is_ascii_digit()))
        .map(|p| p.to_string());

    Some(GranuleInfo {
        product,
        date,
        tile,
        collection,
    })
}
