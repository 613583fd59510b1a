//! Text-backed lifecycle enums.
//!
//! Each enum maps 1:1 to the values allowed by the `CHECK` constraint on the
//! corresponding `TEXT` column, and serializes with the same snake_case
//! spelling on the wire.

use crate::error::CoreError;

macro_rules! define_text_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal) {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The database / wire spelling of this variant.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $val),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($val => Ok($name::$variant),)+
                    other => Err(CoreError::Validation(format!(
                        "Invalid {} '{}'. Must be one of: {}",
                        $label,
                        other,
                        [$($val),+].join(", ")
                    ))),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

define_text_enum! {
    /// Project lifecycle status.
    ProjectStatus ("project status") {
        Planning = "planning",
        Approved = "approved",
        InProgress = "in_progress",
        OnHold = "on_hold",
        Completed = "completed",
        Cancelled = "cancelled",
    }
}

define_text_enum! {
    /// Project scheduling priority.
    ProjectPriority ("project priority") {
        Low = "low",
        Medium = "medium",
        High = "high",
        Urgent = "urgent",
    }
}

define_text_enum! {
    /// Project risk assessment.
    RiskLevel ("risk level") {
        Low = "low",
        Medium = "medium",
        High = "high",
        Critical = "critical",
    }
}

define_text_enum! {
    /// Client relationship stage.
    ClientStatus ("client status") {
        Lead = "lead",
        Opportunity = "opportunity",
        Active = "active",
        Inactive = "inactive",
        Lost = "lost",
    }
}

define_text_enum! {
    /// How a client first reached the company.
    ClientSource ("client source") {
        Referral = "referral",
        Website = "website",
        ColdCall = "cold_call",
        TradeShow = "trade_show",
        SocialMedia = "social_media",
        Other = "other",
    }
}

define_text_enum! {
    /// User account role.
    Role ("role") {
        Admin = "admin",
        Manager = "manager",
        Employee = "employee",
    }
}

define_text_enum! {
    /// User account state.
    UserStatus ("user status") {
        Active = "active",
        Inactive = "inactive",
        Deleted = "deleted",
    }
}

impl ProjectStatus {
    /// Completed and cancelled projects accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, ProjectStatus::Completed | ProjectStatus::Cancelled)
    }
}

impl ClientStatus {
    /// Inactive and lost clients are closed: they count neither toward the
    /// pipeline value nor toward overdue follow-ups.
    pub fn is_closed(self) -> bool {
        matches!(self, ClientStatus::Inactive | ClientStatus::Lost)
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::Planning
    }
}

impl Default for ProjectPriority {
    fn default() -> Self {
        ProjectPriority::Medium
    }
}

impl Default for ClientStatus {
    fn default() -> Self {
        ClientStatus::Lead
    }
}
