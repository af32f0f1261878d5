//! Role capability sets, selected once from the signed-in user's role.

use serde::Serialize;

use crate::domain::user::Role;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ManageTemplates,
    ManageUsers,
    ReviewApprovals,
    ViewApprovalHistory,
    FillForms,
    TrackOwnSubmissions,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardSection {
    Templates,
    Users,
    PendingApprovals,
    ApprovalHistory,
    AvailableTemplates,
    Drafts,
    Submitted,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManageTemplates => "manage_templates",
            Self::ManageUsers => "manage_users",
            Self::ReviewApprovals => "review_approvals",
            Self::ViewApprovalHistory => "view_approval_history",
            Self::FillForms => "fill_forms",
            Self::TrackOwnSubmissions => "track_own_submissions",
        }
    }
}

impl DashboardSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Templates => "templates",
            Self::Users => "users",
            Self::PendingApprovals => "pending_approvals",
            Self::ApprovalHistory => "approval_history",
            Self::AvailableTemplates => "available_templates",
            Self::Drafts => "drafts",
            Self::Submitted => "submitted",
        }
    }
}

pub trait RoleView: Send + Sync {
    fn role(&self) -> Role;
    fn capabilities(&self) -> &'static [Capability];
    fn sections(&self) -> &'static [DashboardSection];

    fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AdminView;

#[derive(Clone, Copy, Debug, Default)]
pub struct ManagerView;

#[derive(Clone, Copy, Debug, Default)]
pub struct EmployeeView;

impl RoleView for AdminView {
    fn role(&self) -> Role {
        Role::Admin
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::ManageTemplates, Capability::ManageUsers]
    }

    fn sections(&self) -> &'static [DashboardSection] {
        &[DashboardSection::Templates, DashboardSection::Users]
    }
}

impl RoleView for ManagerView {
    fn role(&self) -> Role {
        Role::Manager
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::ReviewApprovals, Capability::ViewApprovalHistory]
    }

    fn sections(&self) -> &'static [DashboardSection] {
        &[DashboardSection::PendingApprovals, DashboardSection::ApprovalHistory]
    }
}

impl RoleView for EmployeeView {
    fn role(&self) -> Role {
        Role::Employee
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::FillForms, Capability::TrackOwnSubmissions]
    }

    fn sections(&self) -> &'static [DashboardSection] {
        &[DashboardSection::AvailableTemplates, DashboardSection::Drafts, DashboardSection::Submitted]
    }
}

pub fn view_for(role: Role) -> Box<dyn RoleView> {
    match role {
        Role::Admin => Box::new(AdminView),
        Role::Manager => Box::new(ManagerView),
        Role::Employee => Box::new(EmployeeView),
    }
}

#[cfg(test)]
mod tests {
    use super::{view_for, Capability, DashboardSection};
    use crate::domain::user::Role;

    #[test]
    fn each_role_gets_its_own_view() {
        for role in [Role::Admin, Role::Manager, Role::Employee] {
            assert_eq!(view_for(role).role(), role);
        }
    }

    #[test]
    fn managers_review_but_do_not_manage_templates() {
        let view = view_for(Role::Manager);
        assert!(view.can(Capability::ReviewApprovals));
        assert!(!view.can(Capability::ManageTemplates));
    }

    #[test]
    fn employee_dashboard_lists_drafts_and_submitted() {
        let sections = view_for(Role::Employee).sections();
        assert!(sections.contains(&DashboardSection::Drafts));
        assert!(sections.contains(&DashboardSection::Submitted));
    }
}
