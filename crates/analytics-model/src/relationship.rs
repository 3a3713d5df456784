//! Relationship-type metadata consumed by relationship join fragments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

/// Entity kinds a relationship constraint can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipEntity {
    TrackedEntity,
    Enrollment,
    Event,
}

impl RelationshipEntity {
    /// Junction column on `relationshipitem` and key of the entity table.
    pub fn id_column(&self) -> &'static str {
        match self {
            RelationshipEntity::TrackedEntity => "trackedentityid",
            RelationshipEntity::Enrollment => "enrollmentid",
            RelationshipEntity::Event => "eventid",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            RelationshipEntity::TrackedEntity => "trackedentity",
            RelationshipEntity::Enrollment => "enrollment",
            RelationshipEntity::Event => "event",
        }
    }

    /// Column of the analytics row holding this entity's uid.
    pub fn analytics_column(&self) -> &'static str {
        self.table()
    }
}

impl fmt::Display for RelationshipEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RelationshipEntity::TrackedEntity => "TRACKED_ENTITY",
            RelationshipEntity::Enrollment => "ENROLLMENT",
            RelationshipEntity::Event => "EVENT",
        })
    }
}

impl FromStr for RelationshipEntity {
    type Err = AnalyticsError;

    /// Accepts both the current names and the legacy instance names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TRACKED_ENTITY" | "TRACKED_ENTITY_INSTANCE" => Ok(RelationshipEntity::TrackedEntity),
            "ENROLLMENT" | "PROGRAM_INSTANCE" => Ok(RelationshipEntity::Enrollment),
            "EVENT" | "PROGRAM_STAGE_INSTANCE" => Ok(RelationshipEntity::Event),
            _ => Err(AnalyticsError::UnknownRelationshipEntity {
                entity: s.to_string(),
            }),
        }
    }
}

/// Relationship type as delivered by the metadata store.
///
/// Constraint entities stay as raw names until a join is generated, so an
/// unknown name surfaces as an illegal-query error at that point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipType {
    /// Numeric primary key of the relationship type.
    pub id: i64,
    pub uid: String,
    pub from_entity: String,
    pub to_entity: String,
}

impl RelationshipType {
    pub fn from_constraint(&self) -> Result<RelationshipEntity, AnalyticsError> {
        self.from_entity.parse()
    }

    pub fn to_constraint(&self) -> Result<RelationshipEntity, AnalyticsError> {
        self.to_entity.parse()
    }
}
