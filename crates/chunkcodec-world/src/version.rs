//! Game versions and the data-version lookup table.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::ChunkError;

/// Development stage of a game version. Declaration order is release order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Indev,
    Infdev,
    Alpha,
    Beta,
    Release,
}

/// A game version, totally ordered by stage, then major, minor and patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameVersion {
    pub stage: Stage,
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl GameVersion {
    /// Earliest representable version; chunks without a data version
    /// resolve here.
    pub const FIRST: GameVersion = GameVersion::new(Stage::Indev, 0, 0, 0);

    pub const fn new(stage: Stage, major: u8, minor: u8, patch: u8) -> Self {
        Self {
            stage,
            major,
            minor,
            patch,
        }
    }

    pub const fn release_1(minor: u8, patch: u8) -> Self {
        Self::new(Stage::Release, 1, minor, patch)
    }

    pub const fn beta_1(minor: u8, patch: u8) -> Self {
        Self::new(Stage::Beta, 1, minor, patch)
    }

    pub const fn alpha_1(minor: u8, patch: u8) -> Self {
        Self::new(Stage::Alpha, 1, minor, patch)
    }
}

impl fmt::Display for GameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            Stage::Alpha => f.write_str("a")?,
            Stage::Beta => f.write_str("b")?,
            Stage::Indev => f.write_str("indev-")?,
            Stage::Infdev => f.write_str("infdev-")?,
            Stage::Release => {}
        }
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Parses `1.16.5`, `1.12`, `r1.12`, `b1.7.3` or `a1.2.6`.
impl FromStr for GameVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let (stage, rest) = if let Some(rest) = s.strip_prefix("indev-") {
            (Stage::Indev, rest)
        } else if let Some(rest) = s.strip_prefix("infdev-") {
            (Stage::Infdev, rest)
        } else {
            match s.chars().next() {
                Some('a') => (Stage::Alpha, &s[1..]),
                Some('b') => (Stage::Beta, &s[1..]),
                Some('r') => (Stage::Release, &s[1..]),
                Some(c) if c.is_ascii_digit() => (Stage::Release, s.as_str()),
                Some(c) => return Err(format!("unrecognized stage character '{c}'")),
                None => return Err("empty version string".into()),
            }
        };

        let parts: Vec<&str> = rest.split('.').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(format!("expected major.minor[.patch], got '{rest}'"));
        }
        let num = |p: &str| {
            p.parse::<u8>()
                .map_err(|e| format!("invalid version component '{p}': {e}"))
        };
        let major = num(parts[0])?;
        let minor = num(parts[1])?;
        let patch = match parts.get(2) {
            Some(p) => num(p)?,
            None => 0,
        };
        Ok(GameVersion::new(stage, major, minor, patch))
    }
}

/// Sorted mapping between game versions and the integer `DataVersion`
/// markers written into chunks.
#[derive(Debug, Clone)]
pub struct DataVersionTable {
    rows: Vec<(GameVersion, i32)>,
}

impl DataVersionTable {
    /// Build a table. Rows are sorted by data version, after which the game
    /// versions must strictly ascend too; duplicates on either side fail.
    pub fn new(mut rows: Vec<(GameVersion, i32)>) -> Result<Self, ChunkError> {
        rows.sort_by_key(|&(_, dv)| dv);
        if let Some(w) = rows
            .windows(2)
            .find(|w| w[0].0 >= w[1].0 || w[0].1 == w[1].1)
        {
            return Err(ChunkError::InvalidVersionTable(format!(
                "{} (data version {}) does not precede {} (data version {})",
                w[0].0, w[0].1, w[1].0, w[1].1
            )));
        }
        Ok(Self { rows })
    }

    /// The table of released versions known to this crate.
    pub fn builtin() -> &'static DataVersionTable {
        static TABLE: OnceLock<DataVersionTable> = OnceLock::new();
        TABLE.get_or_init(|| DataVersionTable {
            rows: BUILTIN_ROWS.to_vec(),
        })
    }

    pub fn rows(&self) -> &[(GameVersion, i32)] {
        &self.rows
    }

    /// Smallest cataloged version whose data version is `>= data_version`.
    /// Unlisted markers inherit the next known release.
    pub fn version_for(&self, data_version: i32) -> Option<GameVersion> {
        let i = self.rows.partition_point(|&(_, dv)| dv < data_version);
        self.rows.get(i).map(|&(v, _)| v)
    }

    /// Smallest cataloged row whose version is `>= version`.
    pub fn row_at_or_above(&self, version: GameVersion) -> Option<(GameVersion, i32)> {
        let i = self.rows.partition_point(|&(v, _)| v < version);
        self.rows.get(i).copied()
    }

    /// Data version of the smallest cataloged version `>= version`.
    pub fn data_version_for(&self, version: GameVersion) -> Option<i32> {
        self.row_at_or_above(version).map(|(_, dv)| dv)
    }

    /// Data version of exactly `version`, if cataloged.
    pub fn exact_data_version(&self, version: GameVersion) -> Option<i32> {
        self.rows
            .binary_search_by(|(v, _)| v.cmp(&version))
            .ok()
            .map(|i| self.rows[i].1)
    }
}

const fn r(minor: u8, patch: u8, data_version: i32) -> (GameVersion, i32) {
    (GameVersion::release_1(minor, patch), data_version)
}

static BUILTIN_ROWS: &[(GameVersion, i32)] = &[
    r(9, 0, 169),
    r(9, 1, 175),
    r(9, 2, 176),
    r(9, 3, 183),
    r(9, 4, 184),
    r(10, 0, 510),
    r(10, 1, 511),
    r(10, 2, 512),
    r(11, 0, 819),
    r(11, 1, 921),
    r(11, 2, 922),
    r(12, 0, 1139),
    r(12, 1, 1240),
    r(12, 2, 1343),
    r(13, 0, 1519),
    r(13, 1, 1628),
    r(13, 2, 1631),
    r(14, 0, 1952),
    r(14, 1, 1957),
    r(14, 2, 1963),
    r(14, 3, 1968),
    r(14, 4, 1976),
    r(15, 0, 2225),
    r(15, 1, 2227),
    r(15, 2, 2230),
    r(16, 0, 2566),
    r(16, 1, 2567),
    r(16, 2, 2578),
    r(16, 3, 2580),
    r(16, 4, 2584),
    r(16, 5, 2586),
    r(17, 0, 2724),
    r(17, 1, 2730),
    r(18, 0, 2860),
    r(18, 1, 2865),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        assert!(GameVersion::beta_1(7, 3) < GameVersion::release_1(0, 0));
        assert!(GameVersion::alpha_1(2, 6) < GameVersion::beta_1(0, 0));
        assert!(GameVersion::release_1(9, 4) < GameVersion::release_1(10, 0));
        assert!(GameVersion::release_1(16, 5) > GameVersion::release_1(16, 0));
        assert!(GameVersion::FIRST < GameVersion::alpha_1(0, 0));
    }

    #[test]
    fn parse_and_display() {
        let v: GameVersion = "1.16.5".parse().unwrap();
        assert_eq!(v, GameVersion::release_1(16, 5));
        assert_eq!("1.12".parse::<GameVersion>().unwrap(), GameVersion::release_1(12, 0));
        assert_eq!("r1.12".parse::<GameVersion>().unwrap(), GameVersion::release_1(12, 0));
        let beta: GameVersion = "b1.7.3".parse().unwrap();
        assert_eq!(beta, GameVersion::beta_1(7, 3));
        assert_eq!(beta.to_string(), "b1.7.3");
        assert_eq!(GameVersion::release_1(13, 2).to_string(), "1.13.2");
        assert!("x1.2".parse::<GameVersion>().is_err());
        assert!("1".parse::<GameVersion>().is_err());
        assert!("1.300".parse::<GameVersion>().is_err());
    }

    #[test]
    fn least_upper_bound_resolution() {
        let table = DataVersionTable::new(vec![
            (GameVersion::release_1(17, 0), 2724),
            (GameVersion::release_1(16, 0), 2566),
        ])
        .unwrap();
        assert_eq!(table.version_for(2600), Some(GameVersion::release_1(17, 0)));
        assert_eq!(table.version_for(2566), Some(GameVersion::release_1(16, 0)));
        assert_eq!(table.version_for(100), Some(GameVersion::release_1(16, 0)));
        assert_eq!(table.version_for(2725), None);
    }

    #[test]
    fn version_to_data_version() {
        let table = DataVersionTable::builtin();
        assert_eq!(table.exact_data_version(GameVersion::release_1(16, 5)), Some(2586));
        assert_eq!(table.exact_data_version(GameVersion::release_1(16, 6)), None);
        assert_eq!(
            table.data_version_for(GameVersion::release_1(16, 6)),
            Some(2724)
        );
        assert_eq!(table.data_version_for(GameVersion::beta_1(7, 3)), Some(169));
        assert_eq!(table.data_version_for(GameVersion::release_1(19, 0)), None);
    }

    #[test]
    fn misordered_tables_are_rejected() {
        let err = DataVersionTable::new(vec![
            (GameVersion::release_1(16, 0), 2724),
            (GameVersion::release_1(17, 0), 2566),
        ])
        .unwrap_err();
        assert!(matches!(err, ChunkError::InvalidVersionTable(_)));

        let duplicate = DataVersionTable::new(vec![
            (GameVersion::release_1(16, 0), 2566),
            (GameVersion::release_1(16, 1), 2566),
        ]);
        assert!(duplicate.is_err());
    }

    #[test]
    fn rows_round_up_to_the_next_cataloged_version() {
        let table = DataVersionTable::builtin();
        assert_eq!(
            table.row_at_or_above(GameVersion::release_1(12, 3)),
            Some((GameVersion::release_1(13, 0), 1519))
        );
        assert_eq!(
            table.row_at_or_above(GameVersion::release_1(16, 5)),
            Some((GameVersion::release_1(16, 5), 2586))
        );
        assert_eq!(table.row_at_or_above(GameVersion::release_1(18, 2)), None);
    }

    #[test]
    fn builtin_table_is_sorted_both_ways() {
        let rows = DataVersionTable::builtin().rows();
        assert!(rows.windows(2).all(|w| w[0].0 < w[1].0 && w[0].1 < w[1].1));
        assert_eq!(rows.first().map(|r| r.1), Some(169));
    }
}
