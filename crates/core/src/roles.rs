//! Role capability table.
//!
//! Authorization decisions look up a [`Capabilities`] value once per request
//! instead of comparing role names at each call site.

use serde::Serialize;

use crate::status::Role;

/// A single permission an operation can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// See every project, not only the ones the user manages or works on.
    ViewAllProjects,
    /// Create and edit projects.
    ManageProjects,
    DeleteProjects,
    /// Set a project status outside the normal lifecycle.
    OverrideStatus,
    /// Create and edit clients.
    ManageClients,
    DeleteClients,
    /// See budget, cost, and revenue aggregates.
    ViewFinancials,
    /// Administer user accounts.
    ManageUsers,
}

/// The closed set of capabilities granted to a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub view_all_projects: bool,
    pub manage_projects: bool,
    pub delete_projects: bool,
    pub override_status: bool,
    pub manage_clients: bool,
    pub delete_clients: bool,
    pub view_financials: bool,
    pub manage_users: bool,
}

const ADMIN: Capabilities = Capabilities {
    view_all_projects: true,
    manage_projects: true,
    delete_projects: true,
    override_status: true,
    manage_clients: true,
    delete_clients: true,
    view_financials: true,
    manage_users: true,
};

const MANAGER: Capabilities = Capabilities {
    view_all_projects: true,
    manage_projects: true,
    delete_projects: false,
    override_status: false,
    manage_clients: true,
    delete_clients: false,
    view_financials: true,
    manage_users: false,
};

const EMPLOYEE: Capabilities = Capabilities {
    view_all_projects: false,
    manage_projects: false,
    delete_projects: false,
    override_status: false,
    manage_clients: false,
    delete_clients: false,
    view_financials: false,
    manage_users: false,
};

impl Capabilities {
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::ViewAllProjects => self.view_all_projects,
            Capability::ManageProjects => self.manage_projects,
            Capability::DeleteProjects => self.delete_projects,
            Capability::OverrideStatus => self.override_status,
            Capability::ManageClients => self.manage_clients,
            Capability::DeleteClients => self.delete_clients,
            Capability::ViewFinancials => self.view_financials,
            Capability::ManageUsers => self.manage_users,
        }
    }
}

impl Role {
    /// Look up this role's row in the capability table.
    pub fn capabilities(self) -> Capabilities {
        match self {
            Role::Admin => ADMIN,
            Role::Manager => MANAGER,
            Role::Employee => EMPLOYEE,
        }
    }
}
