//! # ragcore store
//!
//! Tenant-scoped vector store: ingestion, persistence, rebuild, and exact
//! top-k cosine retrieval.
//!
//! Each tenant owns three coupled artifacts (a flat index of unit vectors,
//! a row↔id map, and a document registry) kept mutually consistent by a
//! single-writer discipline per tenant and an atomic generation swap for
//! readers. Ingestion appends when every incoming id is new and rebuilds the
//! whole index when any id collides with an existing row, because the flat
//! index cannot update one row in place.
//!
//! ## Consistency invariants
//!
//! - Every stored or queried vector is unit-normalized at comparison time.
//! - After every committed mutation the row↔id map is a strict bijection
//!   over rows `0..N-1`, and the registry holds exactly the mapped ids.
//! - Readers observe either the fully-old or fully-new generation of the
//!   artifact triple, never a mix; on disk the same holds via
//!   write-temp-then-rename under the tenant writer lock.

mod artifacts;
mod document;
mod error;
mod index;
mod tenant;

pub use document::{Document, DocumentShape};
pub use error::StoreError;
pub use index::VectorIndex;
pub use tenant::{SearchHit, StoreConfig, TenantStore};

/// Bump whenever the on-disk vector artifact layout changes.
pub const VECTOR_SCHEMA_VERSION: u16 = 1;
