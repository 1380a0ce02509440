//! Read model of the IAM instance.

use std::sync::{Arc, LazyLock};

use warden_core::{AggregateId, TenantId};
use warden_events::{
    Columns, Dispatch, Event, EventError, Projection, ReadModel, Reducer, SearchQuery,
    expect_event, transact,
};

use crate::iam::events::*;
use crate::member::MembersReadModel;
use crate::policy::{
    LabelPolicy, LoginPolicy, OrgIamPolicy, PasswordAgePolicy, PasswordComplexityPolicy,
    PasswordLockoutPolicy, PolicyReadModel,
};

/// Setup progress, global settings, members and default policies of the
/// instance.
///
/// Member and policy events are appended to the nested read models; the
/// remaining IAM events are applied to the fields directly.
#[derive(Debug, Clone, PartialEq)]
pub struct IamReadModel {
    base: ReadModel,

    set_up_started: Step,
    set_up_done: Step,
    global_org_id: String,
    project_id: String,

    members: MembersReadModel,

    default_login_policy: PolicyReadModel<LoginPolicy>,
    default_label_policy: PolicyReadModel<LabelPolicy>,
    default_org_iam_policy: PolicyReadModel<OrgIamPolicy>,
    default_password_complexity_policy: PolicyReadModel<PasswordComplexityPolicy>,
    default_password_age_policy: PolicyReadModel<PasswordAgePolicy>,
    default_password_lockout_policy: PolicyReadModel<PasswordLockoutPolicy>,
}

static DISPATCH: LazyLock<Dispatch<IamReadModel>> = LazyLock::new(|| {
    Dispatch::new()
        .on(&[SETUP_STARTED, SETUP_DONE], on_setup_step)
        .on(&[GLOBAL_ORG_SET], on_global_org_set)
        .on(&[PROJECT_SET], on_project_set)
        .route(&[MEMBER_ADDED, MEMBER_CHANGED, MEMBER_REMOVED], members)
        .route(&[LOGIN_POLICY_ADDED, LOGIN_POLICY_CHANGED], login_policy)
        .route(&[LABEL_POLICY_ADDED, LABEL_POLICY_CHANGED], label_policy)
        .route(&[ORG_IAM_POLICY_ADDED, ORG_IAM_POLICY_CHANGED], org_iam_policy)
        .route(
            &[PASSWORD_COMPLEXITY_POLICY_ADDED, PASSWORD_COMPLEXITY_POLICY_CHANGED],
            password_complexity_policy,
        )
        .route(
            &[PASSWORD_AGE_POLICY_ADDED, PASSWORD_AGE_POLICY_CHANGED],
            password_age_policy,
        )
        .route(
            &[PASSWORD_LOCKOUT_POLICY_ADDED, PASSWORD_LOCKOUT_POLICY_CHANGED],
            password_lockout_policy,
        )
});

fn on_setup_step(model: &mut IamReadModel, event: &dyn Event) -> Result<(), EventError> {
    let e = expect_event::<SetupStepEvent>(event, "IAM-xK3ps")?;
    if e.done() {
        model.set_up_done = e.step();
    } else {
        model.set_up_started = e.step();
    }
    Ok(())
}

fn on_global_org_set(model: &mut IamReadModel, event: &dyn Event) -> Result<(), EventError> {
    let e = expect_event::<GlobalOrgSetEvent>(event, "IAM-2mVfd")?;
    model.global_org_id = e.org_id().to_string();
    Ok(())
}

fn on_project_set(model: &mut IamReadModel, event: &dyn Event) -> Result<(), EventError> {
    let e = expect_event::<ProjectSetEvent>(event, "IAM-Lb7dQ")?;
    model.project_id = e.project_id().to_string();
    Ok(())
}

fn members(model: &mut IamReadModel) -> &mut dyn Reducer {
    &mut model.members
}

fn login_policy(model: &mut IamReadModel) -> &mut dyn Reducer {
    &mut model.default_login_policy
}

fn label_policy(model: &mut IamReadModel) -> &mut dyn Reducer {
    &mut model.default_label_policy
}

fn org_iam_policy(model: &mut IamReadModel) -> &mut dyn Reducer {
    &mut model.default_org_iam_policy
}

fn password_complexity_policy(model: &mut IamReadModel) -> &mut dyn Reducer {
    &mut model.default_password_complexity_policy
}

fn password_age_policy(model: &mut IamReadModel) -> &mut dyn Reducer {
    &mut model.default_password_age_policy
}

fn password_lockout_policy(model: &mut IamReadModel) -> &mut dyn Reducer {
    &mut model.default_password_lockout_policy
}

impl IamReadModel {
    /// Read model of the instance `aggregate_id` of `tenant_id`.
    pub fn new(aggregate_id: AggregateId, tenant_id: TenantId) -> Self {
        Self {
            base: ReadModel::new(aggregate_id.clone(), tenant_id),
            set_up_started: Step::default(),
            set_up_done: Step::default(),
            global_org_id: String::new(),
            project_id: String::new(),
            members: MembersReadModel::new(aggregate_id.clone(), tenant_id),
            default_login_policy: PolicyReadModel::new(aggregate_id.clone(), tenant_id),
            default_label_policy: PolicyReadModel::new(aggregate_id.clone(), tenant_id),
            default_org_iam_policy: PolicyReadModel::new(aggregate_id.clone(), tenant_id),
            default_password_complexity_policy: PolicyReadModel::new(aggregate_id.clone(), tenant_id),
            default_password_age_policy: PolicyReadModel::new(aggregate_id.clone(), tenant_id),
            default_password_lockout_policy: PolicyReadModel::new(aggregate_id, tenant_id),
        }
    }

    pub fn aggregate_id(&self) -> &AggregateId {
        self.base.aggregate_id()
    }

    pub fn tenant_id(&self) -> TenantId {
        self.base.tenant_id()
    }

    pub fn processed_sequence(&self) -> u64 {
        self.base.processed_sequence()
    }

    pub fn set_up_started(&self) -> Step {
        self.set_up_started
    }

    pub fn set_up_done(&self) -> Step {
        self.set_up_done
    }

    pub fn global_org_id(&self) -> &str {
        &self.global_org_id
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn members(&self) -> &MembersReadModel {
        &self.members
    }

    pub fn default_login_policy(&self) -> &PolicyReadModel<LoginPolicy> {
        &self.default_login_policy
    }

    pub fn default_label_policy(&self) -> &PolicyReadModel<LabelPolicy> {
        &self.default_label_policy
    }

    pub fn default_org_iam_policy(&self) -> &PolicyReadModel<OrgIamPolicy> {
        &self.default_org_iam_policy
    }

    pub fn default_password_complexity_policy(
        &self,
    ) -> &PolicyReadModel<PasswordComplexityPolicy> {
        &self.default_password_complexity_policy
    }

    pub fn default_password_age_policy(&self) -> &PolicyReadModel<PasswordAgePolicy> {
        &self.default_password_age_policy
    }

    pub fn default_password_lockout_policy(&self) -> &PolicyReadModel<PasswordLockoutPolicy> {
        &self.default_password_lockout_policy
    }
}

impl Reducer for IamReadModel {
    fn append_events(&mut self, events: &[Arc<dyn Event>]) -> Result<(), EventError> {
        transact(self, |m| {
            m.base.append_events(events)?;
            DISPATCH.route_events(m, events)
        })
    }

    /// Direct fields first, then every nested model, then the bookkeeping.
    fn reduce(&mut self) -> Result<(), EventError> {
        transact(self, |m| {
            let pending = m.base.pending().to_vec();
            DISPATCH.reduce_events(m, &pending)?;

            m.members.reduce()?;
            m.default_login_policy.reduce()?;
            m.default_label_policy.reduce()?;
            m.default_org_iam_policy.reduce()?;
            m.default_password_complexity_policy.reduce()?;
            m.default_password_age_policy.reduce()?;
            m.default_password_lockout_policy.reduce()?;

            m.base.reduce()
        })
    }
}

impl Projection for IamReadModel {
    fn query(&self) -> SearchQuery {
        SearchQuery::new(Columns::Event)
            .tenant(self.tenant_id())
            .aggregate_types([AGGREGATE_TYPE])
            .aggregate_ids([self.aggregate_id().clone()])
    }
}
