use crate::model::Entity;

pub(crate) const MATERIAL_ENTITY_GROUPS: [&str; 4] = ["POLYMER", "POLYMER_FAMILY", "MONOMER", "ORGANIC"];
pub(crate) const PROPERTY_NAME_GROUP: &str = "PROP_NAME";
pub(crate) const PROPERTY_VALUE_GROUP: &str = "PROP_VALUE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntityRole {
    Material,
    PropertyName,
    PropertyValue,
}

/// Role of one tagged span. A `PROP_VALUE` span only counts when its text
/// ends with an accepted unit; a suffix test keeps "5 kPa" while rejecting a
/// bare "K" buried inside another unit.
pub(crate) fn entity_role(entity: &Entity, units_lower: &[String]) -> Option<EntityRole> {
    let group = entity.entity_group.as_str();

    if MATERIAL_ENTITY_GROUPS.contains(&group) {
        return Some(EntityRole::Material);
    }
    if group == PROPERTY_NAME_GROUP {
        return Some(EntityRole::PropertyName);
    }
    if group == PROPERTY_VALUE_GROUP {
        let word = entity.word.trim_end().to_lowercase();
        if units_lower.iter().any(|unit| word.ends_with(unit.as_str())) {
            return Some(EntityRole::PropertyValue);
        }
    }

    None
}

/// Passes when a material, a property name and a unit-bearing property value
/// were all tagged at least once.
pub(crate) fn ner_filter(entities: &[Entity], units_lower: &[String]) -> bool {
    let mut material = false;
    let mut property_name = false;
    let mut property_value = false;

    for entity in entities {
        match entity_role(entity, units_lower) {
            Some(EntityRole::Material) => material = true,
            Some(EntityRole::PropertyName) => property_name = true,
            Some(EntityRole::PropertyValue) => property_value = true,
            None => {}
        }

        if material && property_name && property_value {
            return true;
        }
    }

    false
}
