use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub i64);

/// Character shape returned by the list endpoint. `status` and `species`
/// are opaque display text; the upstream enum is not modeled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSummary {
    pub id: CharacterId,
    pub name: String,
    pub status: String,
    pub species: String,
    pub image: String,
}

/// Name-only nested reference. A display label, not a resolvable entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameRef {
    pub name: String,
}

/// Superset returned by the single-entity endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterDetail {
    pub id: CharacterId,
    pub name: String,
    pub status: String,
    pub species: String,
    pub gender: String,
    pub image: String,
    pub origin: NameRef,
    pub location: NameRef,
}
