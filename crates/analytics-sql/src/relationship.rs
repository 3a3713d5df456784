//! Relationship join fragments.
//!
//! A relationship count walks `relationshipitem` → `relationship` →
//! `relationshipitem` starting at the entity the analytics row describes.

use analytics_model::{AnalyticsError, AnalyticsType, RelationshipEntity, RelationshipType, Result};

use crate::fragment::qualified;
use crate::tables::ANALYTICS_ALIAS;

/// Join and where fragment counting relationships of `relationship_type`
/// that start at the row's entity.
///
/// Fails with `UnknownRelationshipEntity` when a constraint names an entity
/// kind we do not know, and with an illegal-query error when the analytics
/// rows do not carry the starting entity.
pub fn relationship_join(
    relationship_type: &RelationshipType,
    analytics_type: AnalyticsType,
) -> Result<String> {
    let from = relationship_type.from_constraint()?;
    let to = relationship_type.to_constraint()?;
    if !row_carries(analytics_type, from) {
        return Err(AnalyticsError::illegal(format!(
            "relationship type `{}` starts at {from}, which {analytics_type} rows do not carry",
            relationship_type.uid
        )));
    }
    Ok(format!(
        "from relationshipitem ri \
         join {from_table} f on {f_id} = {ri_id} \
         join relationship r on r.\"from_relationshipitemid\" = ri.\"relationshipitemid\" \
         join relationshipitem ri2 on ri2.\"relationshipitemid\" = r.\"to_relationshipitemid\" \
         where f.\"uid\" = {row_uid} \
         and r.\"relationshiptypeid\" = {type_id} \
         and {to_id} is not null",
        from_table = from.table(),
        f_id = qualified("f", from.id_column()),
        ri_id = qualified("ri", from.id_column()),
        row_uid = qualified(ANALYTICS_ALIAS, from.analytics_column()),
        type_id = relationship_type.id,
        to_id = qualified("ri2", to.id_column()),
    ))
}

/// Scalar count expression for a relationship-count item.
pub fn relationship_count(
    relationship_type: &RelationshipType,
    analytics_type: AnalyticsType,
) -> Result<String> {
    Ok(format!(
        "(select count(*) {})",
        relationship_join(relationship_type, analytics_type)?
    ))
}

fn row_carries(analytics_type: AnalyticsType, entity: RelationshipEntity) -> bool {
    match analytics_type {
        AnalyticsType::Event => true,
        AnalyticsType::Enrollment => entity != RelationshipEntity::Event,
        AnalyticsType::TrackedEntity => entity == RelationshipEntity::TrackedEntity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relationship(from: &str, to: &str) -> RelationshipType {
        RelationshipType {
            id: 42,
            uid: "Rel1".to_string(),
            from_entity: from.to_string(),
            to_entity: to.to_string(),
        }
    }

    #[test]
    fn tracked_entity_to_event_fragment() {
        let fragment = relationship_join(
            &relationship("TRACKED_ENTITY", "PROGRAM_STAGE_INSTANCE"),
            AnalyticsType::TrackedEntity,
        )
        .expect("fragment");
        assert_eq!(
            fragment,
            "from relationshipitem ri \
             join trackedentity f on f.\"trackedentityid\" = ri.\"trackedentityid\" \
             join relationship r on r.\"from_relationshipitemid\" = ri.\"relationshipitemid\" \
             join relationshipitem ri2 on ri2.\"relationshipitemid\" = r.\"to_relationshipitemid\" \
             where f.\"uid\" = ax.\"trackedentity\" \
             and r.\"relationshiptypeid\" = 42 \
             and ri2.\"eventid\" is not null"
        );
    }

    #[test]
    fn unknown_entity_is_an_illegal_query() {
        let error = relationship_join(&relationship("PATIENT", "EVENT"), AnalyticsType::Event)
            .expect_err("unknown entity");
        assert!(error.is_illegal_query());
        assert!(matches!(
            error,
            AnalyticsError::UnknownRelationshipEntity { ref entity } if entity == "PATIENT"
        ));
    }

    #[test]
    fn rows_must_carry_the_starting_entity() {
        let result = relationship_join(
            &relationship("ENROLLMENT", "TRACKED_ENTITY"),
            AnalyticsType::TrackedEntity,
        );
        assert!(matches!(result, Err(AnalyticsError::IllegalQuery { .. })));
        assert!(
            relationship_count(&relationship("ENROLLMENT", "EVENT"), AnalyticsType::Enrollment)
                .expect("count")
                .starts_with("(select count(*) from relationshipitem ri join enrollment f")
        );
    }
}
