//! Binary snapshots of the engine via `bitcode` with a versioned header.
//!
//! A snapshot holds the world and simulation state only. The registry and
//! resource lookup are shared, read-only inputs and are supplied again on
//! restore, as are event listeners.

use crate::engine::Engine;
use crate::entity::EntityRegistry;
use crate::event::EventBus;
use crate::item::ItemPool;
use crate::registry::Registry;
use crate::resource::ResourceLookup;
use crate::sim::{SimConfig, SimState, SimulationStrategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a Foundry engine snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xF0D7_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Tick count when the snapshot was taken.
    pub tick: u64,
}

impl SnapshotHeader {
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// Decode a snapshot and return only its header. bitcode has no partial
/// decoding, so this reads the whole payload.
pub fn read_snapshot_header(data: &[u8]) -> Result<SnapshotHeader, DeserializeError> {
    let snapshot: EngineSnapshot =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    Ok(snapshot.header)
}

// ---------------------------------------------------------------------------
// Serializable engine state
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct EngineSnapshot {
    header: SnapshotHeader,
    config: SimConfig,
    strategy: SimulationStrategy,
    sim_state: SimState,
    paused: bool,
    entities: EntityRegistry,
    items: ItemPool,
    last_state_hash: u64,
}

impl Engine {
    /// Serialize the world and simulation state.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = EngineSnapshot {
            header: SnapshotHeader::new(self.sim_state.tick),
            config: self.config.clone(),
            strategy: self.strategy,
            sim_state: self.sim_state.clone(),
            paused: self.paused,
            entities: self.entities.clone(),
            items: self.items.clone(),
            last_state_hash: self.last_state_hash,
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Restore an engine from [`Engine::serialize`] output. The header is
    /// validated before the state is used. Event listeners must be
    /// registered again.
    pub fn deserialize(
        data: &[u8],
        registry: Arc<Registry>,
        resources: Box<dyn ResourceLookup>,
    ) -> Result<Self, DeserializeError> {
        let snapshot: EngineSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate()?;

        Ok(Engine {
            config: snapshot.config,
            strategy: snapshot.strategy,
            sim_state: snapshot.sim_state,
            paused: snapshot.paused,
            registry,
            resources,
            entities: snapshot.entities,
            items: snapshot.items,
            last_state_hash: snapshot.last_state_hash,
            event_bus: EventBus::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::names;
    use crate::resource::ResourceMap;
    use crate::test_utils::*;

    fn iron_resources() -> Box<ResourceMap> {
        let mut resources = ResourceMap::new();
        resources.insert(pos(0, 0), standard_item(names::IRON_ORE));
        Box::new(resources)
    }

    #[test]
    fn round_trip_preserves_hash_and_future() {
        let mut engine = iron_gear_line();
        engine.step_n(300);
        let bytes = engine.serialize().unwrap();

        let mut restored =
            Engine::deserialize(&bytes, Arc::new(Registry::standard()), iron_resources()).unwrap();
        assert_eq!(restored.state_hash(), engine.state_hash());
        assert_eq!(restored.compute_state_hash(), engine.compute_state_hash());
        assert_eq!(restored.tick(), 300);

        engine.step_n(300);
        restored.step_n(300);
        assert_eq!(restored.state_hash(), engine.state_hash());
    }

    #[test]
    fn header_reports_tick() {
        let mut engine = iron_gear_line();
        engine.step_n(7);
        let header = read_snapshot_header(&engine.serialize().unwrap()).unwrap();
        assert_eq!(header, SnapshotHeader::new(7));
    }

    #[test]
    fn garbage_is_rejected() {
        let result = Engine::deserialize(
            &[1, 2, 3],
            Arc::new(Registry::standard()),
            Box::new(ResourceMap::new()),
        );
        assert!(matches!(result, Err(DeserializeError::Decode(_))));
    }

    #[test]
    fn header_validation() {
        let mut header = SnapshotHeader::new(0);
        assert!(header.validate().is_ok());
        header.version = FORMAT_VERSION + 1;
        assert!(matches!(header.validate(), Err(DeserializeError::FutureVersion(_))));
        header.magic = 0;
        assert!(matches!(header.validate(), Err(DeserializeError::InvalidMagic(0))));
    }
}
