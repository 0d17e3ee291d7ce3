//! Persistence of the per-tenant artifact triple.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<tenant>/vectors.bin   flat unit-vector index (bincode + zstd)
//! <root>/<tenant>/id_map.json   document id -> row
//! <root>/<tenant>/docs.json     document id -> raw document
//! ```
//!
//! Every file is written to a temp sibling and renamed into place while the
//! tenant writer lock is held, so a load never observes a half-written file.
//! A load that finds the triple incomplete treats the tenant as absent; a
//! load that finds the triple mutually inconsistent fails loudly.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use zstd::{decode_all, encode_all};

use crate::document::Document;
use crate::index::VectorIndex;
use crate::{StoreError, VECTOR_SCHEMA_VERSION};

const ZSTD_LEVEL: i32 = 3;

/// Resolved artifact locations for one tenant.
pub(crate) struct TenantPaths {
    pub dir: PathBuf,
    pub vectors: PathBuf,
    pub id_map: PathBuf,
    pub docs: PathBuf,
}

impl TenantPaths {
    pub fn new(root: &Path, tenant: &str) -> Self {
        let dir = root.join(tenant);
        Self {
            vectors: dir.join("vectors.bin"),
            id_map: dir.join("id_map.json"),
            docs: dir.join("docs.json"),
            dir,
        }
    }

    fn complete(&self) -> bool {
        self.vectors.exists() && self.id_map.exists() && self.docs.exists()
    }
}

#[derive(Serialize, Deserialize)]
struct VectorArtifact {
    schema_version: u16,
    index: VectorIndex,
}

/// Persist the artifact triple as one logical unit.
pub(crate) fn save(
    paths: &TenantPaths,
    index: &VectorIndex,
    id_map: &BTreeMap<String, usize>,
    docs: &BTreeMap<String, Document>,
) -> Result<(), StoreError> {
    fs::create_dir_all(&paths.dir)?;

    let artifact = VectorArtifact {
        schema_version: VECTOR_SCHEMA_VERSION,
        index: index.clone(),
    };
    let encoded =
        encode_to_vec(&artifact, standard()).map_err(|e| StoreError::Artifact(e.to_string()))?;
    let compressed = encode_all(encoded.as_slice(), ZSTD_LEVEL)?;

    write_replacing(&paths.vectors, &compressed)?;
    write_replacing(
        &paths.id_map,
        &serde_json::to_vec_pretty(id_map).map_err(|e| StoreError::Artifact(e.to_string()))?,
    )?;
    write_replacing(
        &paths.docs,
        &serde_json::to_vec_pretty(docs).map_err(|e| StoreError::Artifact(e.to_string()))?,
    )?;
    Ok(())
}

/// Load the artifact triple, or `None` when the tenant has never persisted.
pub(crate) fn load(
    paths: &TenantPaths,
) -> Result<Option<(VectorIndex, BTreeMap<String, usize>, BTreeMap<String, Document>)>, StoreError>
{
    if !paths.complete() {
        return Ok(None);
    }

    let compressed = fs::read(&paths.vectors)?;
    let decompressed = decode_all(compressed.as_slice())?;
    let (artifact, _): (VectorArtifact, _) = decode_from_slice(&decompressed, standard())
        .map_err(|e| StoreError::Artifact(e.to_string()))?;
    if artifact.schema_version != VECTOR_SCHEMA_VERSION {
        return Err(StoreError::Artifact(format!(
            "unsupported vector artifact schema {}",
            artifact.schema_version
        )));
    }

    let id_map: BTreeMap<String, usize> = serde_json::from_slice(&fs::read(&paths.id_map)?)
        .map_err(|e| StoreError::Artifact(e.to_string()))?;
    let docs: BTreeMap<String, Document> = serde_json::from_slice(&fs::read(&paths.docs)?)
        .map_err(|e| StoreError::Artifact(e.to_string()))?;

    validate(&artifact.index, &id_map, &docs)?;
    Ok(Some((artifact.index, id_map, docs)))
}

/// Check the loaded triple is mutually consistent: equal sizes, the row map a
/// bijection onto `0..N-1`, and map ids matching registry ids exactly.
fn validate(
    index: &VectorIndex,
    id_map: &BTreeMap<String, usize>,
    docs: &BTreeMap<String, Document>,
) -> Result<(), StoreError> {
    let rows = index.len();
    if id_map.len() != rows || docs.len() != rows {
        return Err(StoreError::Artifact(format!(
            "artifact sizes disagree: {rows} rows, {} mapped ids, {} documents",
            id_map.len(),
            docs.len()
        )));
    }

    let mut seen = vec![false; rows];
    for (id, &row) in id_map {
        if row >= rows || seen[row] {
            return Err(StoreError::Artifact(format!(
                "row map is not a bijection: id '{id}' maps to row {row}"
            )));
        }
        seen[row] = true;
        if !docs.contains_key(id) {
            return Err(StoreError::Artifact(format!(
                "mapped id '{id}' missing from document registry"
            )));
        }
    }
    Ok(())
}

/// Replace-not-append write: temp sibling then rename.
fn write_replacing(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
