//! Project-side uniqueness namespaces that org removal releases.

use warden_events::UniqueConstraint;

pub const UNIQUE_SAML_ENTITY_ID: &str = "saml_entity_ids";

pub fn add_saml_entity_id_constraint(entity_id: &str) -> UniqueConstraint {
    UniqueConstraint::add(
        UNIQUE_SAML_ENTITY_ID,
        entity_id,
        "Errors.Project.App.SAMLEntityIDAlreadyExists",
    )
}

pub fn remove_saml_entity_id_constraint(entity_id: &str) -> UniqueConstraint {
    UniqueConstraint::remove(UNIQUE_SAML_ENTITY_ID, entity_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ids_share_one_namespace() {
        let add = add_saml_entity_id_constraint("https://sp.example.com");
        let remove = remove_saml_entity_id_constraint("https://sp.example.com");
        assert_eq!(add.unique_type(), remove.unique_type());
        assert_eq!(add.unique_field(), remove.unique_field());
        assert!(add.is_add() && !remove.is_add());
    }
}
