use derive_more::{Deref, Display, FromStr};
use serde::{Deserialize, Serialize};
use std::sync::{LazyLock, Mutex, PoisonError};
use ulid::{Generator, Ulid};

///
/// GENERATOR
/// Process-wide so ids handed out by every store sort in insertion order.
///

static GENERATOR: LazyLock<Mutex<IdGenerator>> =
    LazyLock::new(|| Mutex::new(IdGenerator::default()));

///
/// EntityId
///
/// Store-assigned identity of one record. Immutable after insert, and the
/// tie-breaker of every ordering.
///

#[derive(
    Clone,
    Copy,
    Debug,
    Deref,
    Deserialize,
    Display,
    Eq,
    FromStr,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(transparent)]
pub struct EntityId(Ulid);

impl EntityId {
    /// Allocate the next id from the global monotonic generator.
    #[must_use]
    pub fn generate() -> Self {
        GENERATOR
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generate()
    }

    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    #[must_use]
    pub const fn nil() -> Self {
        Self(Ulid::nil())
    }
}

///
/// IdGenerator
///
/// Monotonic within one millisecond; on overflow of the random part it
/// falls back to a fresh timestamp-based id.
///

pub struct IdGenerator {
    inner: Generator,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self {
            inner: Generator::new(),
        }
    }
}

impl IdGenerator {
    pub fn generate(&mut self) -> EntityId {
        match self.inner.generate() {
            Ok(ulid) => EntityId(ulid),
            Err(_) => {
                // random part overflowed inside the same millisecond
                self.inner = Generator::new();
                EntityId(Ulid::new())
            }
        }
    }
}

///
/// TESTS
///
