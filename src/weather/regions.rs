//! Region lookup tables for the KMA forecast APIs.
//!
//! The two upstream services address locations differently: the
//! short-range service takes grid coordinates (nx, ny), while the
//! mid-range service takes region codes, and the temperature and
//! land/weather sub-endpoints use *different* code tables. Several
//! display names collapse onto one canonical land-forecast area via
//! an alias table. Every lookup falls back to its own default for
//! unknown names; the defaults are independent per table.

/// KMA short-range grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPoint {
    pub nx: i32,
    pub ny: i32,
}

struct CoordEntry {
    name: &'static str,
    grid: GridPoint,
}

/// Ordered by insertion; `/api/regions` exposes this order as-is.
const SHORT_FORECAST_COORDS: &[CoordEntry] = &[
    CoordEntry { name: "제주", grid: GridPoint { nx: 52, ny: 38 } },
    CoordEntry { name: "서귀포", grid: GridPoint { nx: 52, ny: 33 } },
    CoordEntry { name: "제주시", grid: GridPoint { nx: 53, ny: 38 } },
    CoordEntry { name: "서울", grid: GridPoint { nx: 60, ny: 127 } },
    CoordEntry { name: "인천", grid: GridPoint { nx: 55, ny: 124 } },
    CoordEntry { name: "경기", grid: GridPoint { nx: 60, ny: 121 } },
];

const DEFAULT_GRID: GridPoint = GridPoint { nx: 52, ny: 38 }; // 제주

/// Mid-range temperature (getMidTa) region codes.
const MID_TEMP_REGIONS: &[(&str, &str)] = &[
    ("제주", "11G00201"),
    ("서귀포", "11G00401"),
    ("제주시", "11G00201"),
    ("서울", "11B10101"),
    ("인천", "11B20201"),
    ("경기", "11B20601"),
];

const DEFAULT_MID_TEMP: &str = "11G00201"; // 제주

/// Mid-range land/weather (getMidLandFcst) region codes. Coarser than
/// the temperature codes: one code covers a whole forecast area.
const MID_LAND_REGIONS: &[(&str, &str)] = &[
    ("제주", "11G00000"),
    ("서울_인천_경기", "11B00000"),
];

const DEFAULT_MID_LAND: &str = "11G00000"; // 제주

/// Display name → canonical land-forecast area.
const MID_LAND_ALIASES: &[(&str, &str)] = &[
    ("제주", "제주"),
    ("서귀포", "제주"),
    ("제주시", "제주"),
    ("서울", "서울_인천_경기"),
    ("인천", "서울_인천_경기"),
    ("경기", "서울_인천_경기"),
];

/// Immutable region translation tables, built once at startup.
#[derive(Debug, Default)]
pub struct RegionTables;

impl RegionTables {
    pub fn new() -> Self {
        Self
    }

    /// All region names known to the short-range coordinate table,
    /// in table insertion order.
    pub fn region_names(&self) -> Vec<&'static str> {
        SHORT_FORECAST_COORDS.iter().map(|e| e.name).collect()
    }

    /// Grid coordinates for the short-range API. Unknown regions use
    /// the default grid.
    pub fn grid_for(&self, region: &str) -> GridPoint {
        SHORT_FORECAST_COORDS
            .iter()
            .find(|e| e.name == region)
            .map(|e| e.grid)
            .unwrap_or(DEFAULT_GRID)
    }

    /// Mid-range temperature region code.
    pub fn mid_temp_code(&self, region: &str) -> &'static str {
        MID_TEMP_REGIONS
            .iter()
            .find(|(name, _)| *name == region)
            .map(|(_, code)| *code)
            .unwrap_or(DEFAULT_MID_TEMP)
    }

    /// Canonical land-forecast area for a display name. Unknown names
    /// map to 제주.
    pub fn land_area_for(&self, region: &str) -> &'static str {
        MID_LAND_ALIASES
            .iter()
            .find(|(name, _)| *name == region)
            .map(|(_, area)| *area)
            .unwrap_or("제주")
    }

    /// Mid-range land/weather region code, resolved via the alias table.
    pub fn mid_land_code(&self, region: &str) -> &'static str {
        let area = self.land_area_for(region);
        MID_LAND_REGIONS
            .iter()
            .find(|(name, _)| *name == area)
            .map(|(_, code)| *code)
            .unwrap_or(DEFAULT_MID_LAND)
    }
}
