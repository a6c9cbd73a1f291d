//! Format rules per era and the resolver from data versions to rules.
//!
//! Codecs never compare version numbers themselves. They read the flags of
//! a [`FormatRules`] value, and the era table below is the only place that
//! knows which release changed what. Supporting a new era means adding a
//! row, plus a new flag only if the new era actually behaves differently.

use crate::bitpack::SpanMode;
use crate::biome::CELL_LAYERS;
use crate::error::ChunkError;
use crate::version::{DataVersionTable, GameVersion};

/// How a chunk stores its biomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiomeLayout {
    /// 256-entry byte array, one id per column (before 1.13).
    Bytes2D,
    /// 256-entry int array, one id per column (1.13 - 1.14).
    Ints2D,
    /// Int array of 4x4x4 cells (1.15 onward).
    Cells3D,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatRules {
    /// Blocks are numeric ids plus nibble data instead of palettes.
    pub numeric_block_ids: bool,
    /// Packed indices may straddle two longs.
    pub word_spanning: bool,
    /// Sections below 0 and above 15 are allowed.
    pub unlimited_vertical_range: bool,
    pub biome_layout: BiomeLayout,
    /// Block states and biomes are per-section paletted containers.
    pub section_containers: bool,
}

impl FormatRules {
    /// Rules of the era containing `version`.
    pub fn for_version(version: GameVersion) -> Self {
        ERAS.iter()
            .rev()
            .find(|(start, _)| *start <= version)
            .map_or(ERAS[0].1, |&(_, rules)| rules)
    }

    pub fn span_mode(&self) -> SpanMode {
        if self.word_spanning {
            SpanMode::Spanning
        } else {
            SpanMode::Aligned
        }
    }

    /// Inclusive block y range that may hold sections.
    pub fn vertical_bounds(&self) -> (i32, i32) {
        if self.unlimited_vertical_range {
            (i8::MIN as i32 * 16, i8::MAX as i32 * 16 + 15)
        } else {
            (0, 255)
        }
    }

    /// Number of 4x4 biome layers written per chunk, 0 for the column layouts.
    pub fn biome_layers(&self) -> usize {
        match self.biome_layout {
            BiomeLayout::Cells3D => CELL_LAYERS,
            BiomeLayout::Bytes2D | BiomeLayout::Ints2D => 0,
        }
    }
}

const NUMERIC_ERA: FormatRules = FormatRules {
    numeric_block_ids: true,
    word_spanning: true,
    unlimited_vertical_range: false,
    biome_layout: BiomeLayout::Bytes2D,
    section_containers: false,
};

const FLATTENING_ERA: FormatRules = FormatRules {
    numeric_block_ids: false,
    biome_layout: BiomeLayout::Ints2D,
    ..NUMERIC_ERA
};

const CELL_BIOME_ERA: FormatRules = FormatRules {
    biome_layout: BiomeLayout::Cells3D,
    ..FLATTENING_ERA
};

const ALIGNED_ERA: FormatRules = FormatRules {
    word_spanning: false,
    ..CELL_BIOME_ERA
};

const TALL_ERA: FormatRules = FormatRules {
    unlimited_vertical_range: true,
    ..ALIGNED_ERA
};

const CONTAINER_ERA: FormatRules = FormatRules {
    section_containers: true,
    ..TALL_ERA
};

/// First version of each era, ascending.
static ERAS: &[(GameVersion, FormatRules)] = &[
    (GameVersion::FIRST, NUMERIC_ERA),
    (GameVersion::release_1(13, 0), FLATTENING_ERA),
    (GameVersion::release_1(15, 0), CELL_BIOME_ERA),
    (GameVersion::release_1(16, 0), ALIGNED_ERA),
    (GameVersion::release_1(17, 0), TALL_ERA),
    (GameVersion::release_1(18, 0), CONTAINER_ERA),
];

/// Outcome of resolving a chunk's version marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedFormat {
    pub version: GameVersion,
    /// `None` for versions that predate data versions.
    pub data_version: Option<i32>,
    pub rules: FormatRules,
}

/// Maps data versions and game versions to [`FormatRules`].
#[derive(Debug, Clone, Copy)]
pub struct FormatResolver<'a> {
    table: &'a DataVersionTable,
}

impl FormatResolver<'static> {
    pub fn builtin() -> Self {
        Self::new(DataVersionTable::builtin())
    }
}

impl Default for FormatResolver<'static> {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<'a> FormatResolver<'a> {
    pub fn new(table: &'a DataVersionTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'a DataVersionTable {
        self.table
    }

    /// Resolve a chunk's `DataVersion`. A missing marker means the chunk
    /// predates the flattening and uses numeric block ids.
    pub fn resolve(&self, data_version: Option<i32>) -> Result<ResolvedFormat, ChunkError> {
        let Some(dv) = data_version else {
            return Ok(ResolvedFormat {
                version: GameVersion::FIRST,
                data_version: None,
                rules: FormatRules::for_version(GameVersion::FIRST),
            });
        };
        let version = self.table.version_for(dv).ok_or_else(|| {
            ChunkError::UnsupportedVersion(format!(
                "data version {dv} is newer than every known release"
            ))
        })?;
        Ok(ResolvedFormat {
            version,
            data_version: Some(dv),
            rules: FormatRules::for_version(version),
        })
    }

    /// Resolve a target version for writing. Versions missing from the
    /// table round up to the next cataloged release, and both the marker
    /// and the layout come from that release so the chunk reads back the
    /// way it was written.
    pub fn resolve_version(&self, version: GameVersion) -> Result<ResolvedFormat, ChunkError> {
        let predates_table = self
            .table
            .rows()
            .first()
            .is_none_or(|&(first, _)| version < first);
        if predates_table {
            let rules = FormatRules::for_version(version);
            // Chunks without a marker are always read as numeric.
            if !rules.numeric_block_ids {
                return Err(ChunkError::UnsupportedVersion(format!(
                    "{version} has no known data version"
                )));
            }
            return Ok(ResolvedFormat {
                version,
                data_version: None,
                rules,
            });
        }
        let (cataloged, dv) = self.table.row_at_or_above(version).ok_or_else(|| {
            ChunkError::UnsupportedVersion(format!("{version} is newer than every known release"))
        })?;
        Ok(ResolvedFormat {
            version: cataloged,
            data_version: Some(dv),
            rules: FormatRules::for_version(cataloged),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn era_flags() {
        let v1_12 = FormatRules::for_version(GameVersion::release_1(12, 2));
        assert!(v1_12.numeric_block_ids);
        assert_eq!(v1_12.biome_layout, BiomeLayout::Bytes2D);

        let v1_14 = FormatRules::for_version(GameVersion::release_1(14, 4));
        assert!(!v1_14.numeric_block_ids);
        assert!(v1_14.word_spanning);
        assert_eq!(v1_14.biome_layout, BiomeLayout::Ints2D);

        let v1_15 = FormatRules::for_version(GameVersion::release_1(15, 2));
        assert_eq!(v1_15.span_mode(), SpanMode::Spanning);
        assert_eq!(v1_15.biome_layers(), 64);

        let v1_16 = FormatRules::for_version(GameVersion::release_1(16, 0));
        assert_eq!(v1_16.span_mode(), SpanMode::Aligned);
        assert_eq!(v1_16.vertical_bounds(), (0, 255));

        let v1_17 = FormatRules::for_version(GameVersion::release_1(17, 1));
        assert!(v1_17.unlimited_vertical_range);
        assert_eq!(v1_17.vertical_bounds(), (-2048, 2047));
        assert!(!v1_17.section_containers);

        assert!(FormatRules::for_version(GameVersion::release_1(18, 0)).section_containers);
        assert!(FormatRules::for_version(GameVersion::beta_1(7, 3)).numeric_block_ids);
    }

    #[test]
    fn resolves_to_least_upper_bound() {
        let table = DataVersionTable::new(vec![
            (GameVersion::release_1(16, 0), 2566),
            (GameVersion::release_1(17, 0), 2724),
        ])
        .unwrap();
        let resolver = FormatResolver::new(&table);

        let between = resolver.resolve(Some(2600)).unwrap();
        assert_eq!(between.version, GameVersion::release_1(17, 0));
        assert_eq!(between.rules, FormatRules::for_version(GameVersion::release_1(17, 0)));

        let exact = resolver.resolve(Some(2566)).unwrap();
        assert_eq!(exact.version, GameVersion::release_1(16, 0));
        assert_eq!(exact.rules, FormatRules::for_version(GameVersion::release_1(16, 0)));
        assert_eq!(exact.data_version, Some(2566));
    }

    #[test]
    fn missing_marker_is_pre_flattening() {
        let resolved = FormatResolver::builtin().resolve(None).unwrap();
        assert!(resolved.rules.numeric_block_ids);
        assert_eq!(resolved.data_version, None);
    }

    #[test]
    fn marker_beyond_table_is_unsupported() {
        let err = FormatResolver::builtin().resolve(Some(99_999)).unwrap_err();
        assert!(matches!(err, ChunkError::UnsupportedVersion(_)));
    }

    #[test]
    fn builtin_boundaries() {
        let resolver = FormatResolver::builtin();
        assert!(resolver.resolve(Some(1343)).unwrap().rules.numeric_block_ids);
        assert!(!resolver.resolve(Some(1344)).unwrap().rules.numeric_block_ids);
        assert!(resolver.resolve(Some(2230)).unwrap().rules.word_spanning);
        assert!(!resolver.resolve(Some(2231)).unwrap().rules.word_spanning);
    }

    #[test]
    fn target_versions() {
        let resolver = FormatResolver::builtin();
        let v = resolver.resolve_version(GameVersion::release_1(16, 5)).unwrap();
        assert_eq!(v.data_version, Some(2586));
        let beta = resolver.resolve_version(GameVersion::beta_1(7, 3)).unwrap();
        assert_eq!(beta.data_version, None);
        assert!(beta.rules.numeric_block_ids);
        assert!(resolver.resolve_version(GameVersion::release_1(20, 0)).is_err());
    }

    #[test]
    fn unlisted_targets_use_the_rules_of_their_marker() {
        let resolver = FormatResolver::builtin();

        let v = resolver.resolve_version(GameVersion::release_1(12, 3)).unwrap();
        assert_eq!(v.version, GameVersion::release_1(13, 0));
        assert_eq!(v.data_version, Some(1519));
        assert!(!v.rules.numeric_block_ids);

        let v = resolver.resolve_version(GameVersion::release_1(15, 3)).unwrap();
        assert_eq!(v.version, GameVersion::release_1(16, 0));
        assert_eq!(v.data_version, Some(2566));
        assert_eq!(v.rules.span_mode(), SpanMode::Aligned);

        for target in [GameVersion::release_1(12, 3), GameVersion::release_1(15, 3)] {
            let written = resolver.resolve_version(target).unwrap();
            let read = resolver.resolve(written.data_version).unwrap();
            assert_eq!(read.rules, written.rules);
            assert_eq!(read.version, written.version);
        }
    }

    #[test]
    fn marker_less_targets_must_be_numeric() {
        let table = DataVersionTable::new(vec![(GameVersion::release_1(16, 0), 2566)]).unwrap();
        let resolver = FormatResolver::new(&table);
        let err = resolver.resolve_version(GameVersion::release_1(14, 4)).unwrap_err();
        assert!(matches!(err, ChunkError::UnsupportedVersion(_)));
        assert!(resolver.resolve_version(GameVersion::release_1(12, 2)).is_ok());
    }
}
