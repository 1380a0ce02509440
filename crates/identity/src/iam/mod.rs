//! IAM instance aggregate (`iam`).

pub mod events;
pub mod read_model;

pub use events::{
    AGGREGATE_TYPE, GlobalOrgSetEvent, ProjectSetEvent, SetupStepEvent, Step,
};
pub use read_model::IamReadModel;

use warden_events::EventRegistry;

use crate::member::{member_added_mapper, member_changed_mapper, member_removed_mapper};
use crate::policy::{
    LabelPolicy, LoginPolicy, OrgIamPolicy, PasswordAgePolicy, PasswordComplexityPolicy,
    PasswordLockoutPolicy, policy_added_mapper, policy_changed_mapper,
};

pub fn register_event_mappers(registry: &mut EventRegistry) {
    use events::*;

    registry
        .register(SETUP_STARTED, setup_step_mapper)
        .register(SETUP_DONE, setup_step_mapper)
        .register(GLOBAL_ORG_SET, global_org_set_mapper)
        .register(PROJECT_SET, project_set_mapper)
        .register(MEMBER_ADDED, member_added_mapper)
        .register(MEMBER_CHANGED, member_changed_mapper)
        .register(MEMBER_REMOVED, member_removed_mapper)
        .register(LOGIN_POLICY_ADDED, policy_added_mapper::<LoginPolicy>)
        .register(LOGIN_POLICY_CHANGED, policy_changed_mapper::<LoginPolicy>)
        .register(LABEL_POLICY_ADDED, policy_added_mapper::<LabelPolicy>)
        .register(LABEL_POLICY_CHANGED, policy_changed_mapper::<LabelPolicy>)
        .register(ORG_IAM_POLICY_ADDED, policy_added_mapper::<OrgIamPolicy>)
        .register(ORG_IAM_POLICY_CHANGED, policy_changed_mapper::<OrgIamPolicy>)
        .register(
            PASSWORD_COMPLEXITY_POLICY_ADDED,
            policy_added_mapper::<PasswordComplexityPolicy>,
        )
        .register(
            PASSWORD_COMPLEXITY_POLICY_CHANGED,
            policy_changed_mapper::<PasswordComplexityPolicy>,
        )
        .register(PASSWORD_AGE_POLICY_ADDED, policy_added_mapper::<PasswordAgePolicy>)
        .register(PASSWORD_AGE_POLICY_CHANGED, policy_changed_mapper::<PasswordAgePolicy>)
        .register(PASSWORD_LOCKOUT_POLICY_ADDED, policy_added_mapper::<PasswordLockoutPolicy>)
        .register(
            PASSWORD_LOCKOUT_POLICY_CHANGED,
            policy_changed_mapper::<PasswordLockoutPolicy>,
        );
}
