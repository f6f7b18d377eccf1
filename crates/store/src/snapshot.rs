use crate::error::{Result, StoreError};
use crate::relations::{check_reference, RelationTable};
use crate::senses::SenseTable;
use crate::store::SenseStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use wordsense_lexicon::{sense_text, CanonicalSense, ResolvedRelation};

pub const STORE_SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Serialized form of a finished store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub schema_version: u32,
    pub senses: Vec<CanonicalSense>,
    pub relations: Vec<ResolvedRelation>,
}

impl SenseStore {
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            schema_version: STORE_SNAPSHOT_SCHEMA_VERSION,
            senses: self.senses().to_vec(),
            relations: self.relations().to_vec(),
        }
    }

    /// Rebuild a store from a snapshot, re-checking every invariant the build guarantees:
    /// contiguous ids, unique `(word, definition)`, consistent `text`, and relations that only
    /// reference senses of their target word.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self> {
        if snapshot.schema_version != STORE_SNAPSHOT_SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema {
                found: snapshot.schema_version,
                expected: STORE_SNAPSHOT_SCHEMA_VERSION,
            });
        }

        let mut senses = SenseTable::with_capacity(snapshot.senses.len());
        for (position, sense) in snapshot.senses.into_iter().enumerate() {
            if sense.id.index() != position {
                return Err(StoreError::Corrupt(format!(
                    "sense at position {position} has id {}",
                    sense.id
                )));
            }
            if sense.text != sense_text(&sense.word, &sense.definition) {
                return Err(StoreError::Corrupt(format!(
                    "sense {} text does not match its word and definition",
                    sense.id
                )));
            }
            senses.insert(&sense.word, &sense.definition)?;
        }

        let mut relations = RelationTable::new();
        for (position, relation) in snapshot.relations.into_iter().enumerate() {
            if relation.id.get() as usize != position {
                return Err(StoreError::Corrupt(format!(
                    "relation at position {position} has id {}",
                    relation.id
                )));
            }
            check_reference(&senses, relation.matched_sense_id, &relation.target_word)?;
            relations.push_verified(relation);
        }

        Ok(Self::from_tables(senses, relations))
    }

    /// Write the snapshot atomically (temp file + rename)
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec(&self.snapshot())?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        log::info!(
            "Saved store snapshot to {} ({} senses, {} relations)",
            path.display(),
            self.sense_count(),
            self.relation_count()
        );
        Ok(())
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let snapshot: StoreSnapshot = serde_json::from_slice(&bytes)?;
        let store = Self::from_snapshot(snapshot)?;
        log::info!(
            "Loaded store snapshot from {} ({} senses, {} relations)",
            path.display(),
            store.sense_count(),
            store.relation_count()
        );
        Ok(store)
    }
}
