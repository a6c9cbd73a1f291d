//! Block states: a namespaced id plus a property compound.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use chunkcodec_nbt::{NbtCompound, NbtError, NbtTag};

pub const DEFAULT_NAMESPACE: &str = "minecraft";
pub const AIR_ID: &str = "minecraft:air";

/// Namespace used for blocks read from numeric-ID chunks.
pub const LEGACY_NAMESPACE: &str = "legacy";
const LEGACY_DATA_PROPERTY: &str = "data";

/// An immutable block state. Palettes share instances through `Arc`.
///
/// Two states are equal when their ids and property compounds match exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockState {
    id: String,
    properties: NbtCompound,
}

impl BlockState {
    /// Create a state without properties. A bare name gets the
    /// `minecraft` namespace.
    pub fn new(id: &str) -> Self {
        let id = if id.contains(':') {
            id.to_owned()
        } else {
            format!("{DEFAULT_NAMESPACE}:{id}")
        };
        Self {
            id,
            properties: NbtCompound::new(),
        }
    }

    pub fn air() -> Self {
        Self::new(AIR_ID)
    }

    /// State for a numeric block id and its 4-bit data value.
    pub fn legacy(block_id: u16, data: u8) -> Self {
        if block_id == 0 && data == 0 {
            return Self::air();
        }
        Self::new(&format!("{LEGACY_NAMESPACE}:{block_id}"))
            .with_property(LEGACY_DATA_PROPERTY, (data & 0x0F) as i8)
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<NbtTag>) -> Self {
        self.properties.set(key, value);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn namespace(&self) -> &str {
        self.id.split_once(':').map_or(DEFAULT_NAMESPACE, |(ns, _)| ns)
    }

    /// The id without its namespace.
    pub fn name(&self) -> &str {
        self.id.split_once(':').map_or(self.id.as_str(), |(_, name)| name)
    }

    pub fn properties(&self) -> &NbtCompound {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&NbtTag> {
        self.properties.try_get(key)
    }

    /// Plain `minecraft:air` without properties, the empty state of a section.
    pub fn is_empty_air(&self) -> bool {
        self.id == AIR_ID && self.properties.is_empty()
    }

    /// Any of the air variants.
    pub fn is_air(&self) -> bool {
        matches!(
            self.id.as_str(),
            "minecraft:air" | "minecraft:cave_air" | "minecraft:void_air"
        )
    }

    /// Numeric id and data value, if this state came from a numeric-ID chunk.
    pub fn legacy_id(&self) -> Option<(u16, u8)> {
        if self.is_empty_air() {
            return Some((0, 0));
        }
        if self.namespace() != LEGACY_NAMESPACE {
            return None;
        }
        let block_id = self.name().parse::<u16>().ok()?;
        let data = self
            .properties
            .try_get(LEGACY_DATA_PROPERTY)
            .and_then(NbtTag::as_integer)
            .unwrap_or(0);
        Some((block_id, (data & 0x0F) as u8))
    }

    /// Parse a palette entry: `{Name: String, Properties?: Compound}`.
    pub fn from_palette_entry(entry: &NbtCompound) -> Result<Self, NbtError> {
        let mut state = Self::new(entry.get_string("Name")?);
        if let Some(props) = entry.try_get("Properties") {
            match props.as_compound() {
                Some(props) => state.properties = props.clone(),
                None => {
                    return Err(NbtError::TypeMismatch {
                        key: "Properties".into(),
                        expected: chunkcodec_nbt::TagKind::Compound,
                        found: props.kind(),
                    })
                }
            }
        }
        Ok(state)
    }

    pub fn to_palette_entry(&self) -> NbtCompound {
        let mut entry = NbtCompound::with_capacity(2);
        entry.set("Name", self.id.as_str());
        if !self.properties.is_empty() {
            entry.set("Properties", self.properties.clone());
        }
        entry
    }
}

/// Shared `minecraft:air`, returned for blocks in absent sections.
pub fn shared_air() -> Arc<BlockState> {
    static AIR: OnceLock<Arc<BlockState>> = OnceLock::new();
    Arc::clone(AIR.get_or_init(|| Arc::new(BlockState::air())))
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)?;
        if self.properties.is_empty() {
            return Ok(());
        }
        let mut props: Vec<_> = self.properties.iter().collect();
        props.sort_by(|a, b| a.0.cmp(b.0));
        f.write_str("[")?;
        for (i, (key, value)) in props.into_iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match value {
                NbtTag::String(s) => write!(f, "{key}={s}")?,
                other => write!(f, "{key}={other}")?,
            }
        }
        f.write_str("]")
    }
}

/// Parses `namespace:name[key=value,...]`. Property values are kept as strings,
/// matching how palettes store them.
impl FromStr for BlockState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (id, props) = match s.split_once('[') {
            Some((id, rest)) => {
                let props = rest
                    .strip_suffix(']')
                    .ok_or_else(|| format!("unterminated property list in '{s}'"))?;
                (id, Some(props))
            }
            None => (s, None),
        };
        if id.is_empty() {
            return Err("empty block id".into());
        }
        let mut state = BlockState::new(id);
        if let Some(props) = props.filter(|p| !p.is_empty()) {
            for pair in props.split(',') {
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("property '{pair}' is missing '='"))?;
                state = state.with_property(key.trim(), value.trim());
            }
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_defaults_to_minecraft() {
        let stone = BlockState::new("stone");
        assert_eq!(stone.id(), "minecraft:stone");
        assert_eq!(stone.namespace(), "minecraft");
        assert_eq!(stone.name(), "stone");
        assert_eq!(BlockState::new("mymod:ore").namespace(), "mymod");
    }

    #[test]
    fn equality_includes_properties() {
        let a = BlockState::new("oak_log").with_property("axis", "y");
        let b = BlockState::new("minecraft:oak_log").with_property("axis", "y");
        let c = BlockState::new("oak_log").with_property("axis", "x");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, BlockState::new("oak_log"));
    }

    #[test]
    fn palette_entry_roundtrip() {
        let state = BlockState::new("oak_stairs")
            .with_property("facing", "east")
            .with_property("half", "bottom");
        let entry = state.to_palette_entry();
        assert_eq!(entry.get_string("Name").unwrap(), "minecraft:oak_stairs");
        assert_eq!(BlockState::from_palette_entry(&entry).unwrap(), state);

        let bare = BlockState::new("dirt").to_palette_entry();
        assert!(!bare.contains_key("Properties"));
    }

    #[test]
    fn palette_entry_without_name_fails() {
        let entry = NbtCompound::new();
        assert!(matches!(
            BlockState::from_palette_entry(&entry),
            Err(NbtError::MissingKey(_))
        ));
    }

    #[test]
    fn legacy_ids() {
        assert!(BlockState::legacy(0, 0).is_empty_air());
        let wool = BlockState::legacy(35, 14);
        assert_eq!(wool.id(), "legacy:35");
        assert_eq!(wool.legacy_id(), Some((35, 14)));
        assert_eq!(BlockState::new("stone").legacy_id(), None);
    }

    #[test]
    fn parse_and_display() {
        let state: BlockState = "oak_stairs[half=bottom,facing=east]".parse().unwrap();
        assert_eq!(state.to_string(), "minecraft:oak_stairs[facing=east,half=bottom]");
        let plain: BlockState = "minecraft:stone".parse().unwrap();
        assert_eq!(plain, BlockState::new("stone"));
        assert!("stone[axis".parse::<BlockState>().is_err());
        assert!("".parse::<BlockState>().is_err());
    }

    #[test]
    fn air_variants() {
        assert!(BlockState::new("cave_air").is_air());
        assert!(!BlockState::new("cave_air").is_empty_air());
        assert!(shared_air().is_empty_air());
    }
}
