//! Client entity model, DTOs, list filters and the camelCase view.

use buildcrm_core::display::date_start_utc;
use buildcrm_core::pagination::SortOrder;
use buildcrm_core::status::{ClientSource, ClientStatus};
use buildcrm_core::types::{Date, DbId, Money, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::columns::NullableText;

/// A client row from the `clients` table.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Client {
    pub id: DbId,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub industry: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ClientStatus,
    #[sqlx(try_from = "NullableText")]
    pub source: Option<ClientSource>,
    pub rating: Option<i16>,
    pub estimated_value: Option<Money>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub last_contact_date: Option<Date>,
    pub next_follow_up_date: Option<Date>,
    pub assigned_to: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

pub const CLIENT_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("company_name", "companyName"),
    ("contact_name", "contactName"),
    ("email", "email"),
    ("phone", "phone"),
    ("address", "address"),
    ("city", "city"),
    ("state", "state"),
    ("postal_code", "postalCode"),
    ("industry", "industry"),
    ("status", "status"),
    ("source", "source"),
    ("rating", "rating"),
    ("estimated_value", "estimatedValue"),
    ("tags", "tags"),
    ("notes", "notes"),
    ("last_contact_date", "lastContactDate"),
    ("next_follow_up_date", "nextFollowUpDate"),
    ("assigned_to", "assignedTo"),
    ("created_at", "createdAt"),
    ("updated_at", "updatedAt"),
];

/// DTO for creating a new client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClient {
    pub company_name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub industry: Option<String>,
    /// Defaults to `lead`.
    pub status: Option<ClientStatus>,
    pub source: Option<ClientSource>,
    pub rating: Option<i16>,
    pub estimated_value: Option<Money>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
    pub last_contact_date: Option<Date>,
    pub next_follow_up_date: Option<Date>,
    pub assigned_to: Option<DbId>,
}

/// DTO for updating an existing client. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClient {
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub industry: Option<String>,
    pub status: Option<ClientStatus>,
    pub source: Option<ClientSource>,
    pub rating: Option<i16>,
    pub estimated_value: Option<Money>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
    pub last_contact_date: Option<Date>,
    pub next_follow_up_date: Option<Date>,
    pub assigned_to: Option<DbId>,
}

/// Optional predicates for client listing.
#[derive(Debug, Clone, Default)]
pub struct ClientFilters {
    pub status: Option<ClientStatus>,
    pub source: Option<ClientSource>,
    pub assigned_to: Option<DbId>,
    /// Case-insensitive substring over company, contact and email.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientSortKey {
    #[default]
    #[serde(alias = "created_at")]
    CreatedAt,
    #[serde(alias = "updated_at")]
    UpdatedAt,
    #[serde(alias = "company_name")]
    CompanyName,
    Status,
    #[serde(alias = "estimated_value")]
    EstimatedValue,
    #[serde(alias = "next_follow_up_date")]
    NextFollowUpDate,
}

impl ClientSortKey {
    pub fn column(self) -> &'static str {
        match self {
            ClientSortKey::CreatedAt => "created_at",
            ClientSortKey::UpdatedAt => "updated_at",
            ClientSortKey::CompanyName => "company_name",
            ClientSortKey::Status => "status",
            ClientSortKey::EstimatedValue => "estimated_value",
            ClientSortKey::NextFollowUpDate => "next_follow_up_date",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientSort {
    pub key: ClientSortKey,
    pub order: SortOrder,
}

/// Wire shape of a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    pub id: DbId,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub industry: Option<String>,
    pub status: ClientStatus,
    pub source: Option<ClientSource>,
    pub rating: Option<i16>,
    pub estimated_value: Option<Money>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub last_contact_date: Option<Date>,
    pub next_follow_up_date: Option<Date>,
    pub assigned_to: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Derived: the follow-up date has passed on an open client.
    #[serde(default)]
    pub follow_up_overdue: bool,
}

impl ClientView {
    pub fn at(client: Client, now: Timestamp) -> Self {
        let follow_up_overdue = !client.status.is_closed()
            && client
                .next_follow_up_date
                .is_some_and(|date| date_start_utc(date) < now);

        Self {
            id: client.id,
            company_name: client.company_name,
            contact_name: client.contact_name,
            email: client.email,
            phone: client.phone,
            address: client.address,
            city: client.city,
            state: client.state,
            postal_code: client.postal_code,
            industry: client.industry,
            status: client.status,
            source: client.source,
            rating: client.rating,
            estimated_value: client.estimated_value,
            tags: client.tags,
            notes: client.notes,
            last_contact_date: client.last_contact_date,
            next_follow_up_date: client.next_follow_up_date,
            assigned_to: client.assigned_to,
            created_at: client.created_at,
            updated_at: client.updated_at,
            follow_up_overdue,
        }
    }
}

impl From<Client> for ClientView {
    fn from(client: Client) -> Self {
        Self::at(client, Utc::now())
    }
}

impl From<ClientView> for Client {
    fn from(view: ClientView) -> Self {
        Self {
            id: view.id,
            company_name: view.company_name,
            contact_name: view.contact_name,
            email: view.email,
            phone: view.phone,
            address: view.address,
            city: view.city,
            state: view.state,
            postal_code: view.postal_code,
            industry: view.industry,
            status: view.status,
            source: view.source,
            rating: view.rating,
            estimated_value: view.estimated_value,
            tags: view.tags,
            notes: view.notes,
            last_contact_date: view.last_contact_date,
            next_follow_up_date: view.next_follow_up_date,
            assigned_to: view.assigned_to,
            created_at: view.created_at,
            updated_at: view.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildcrm_core::case::check_field_table;
    use chrono::Duration;

    fn sample(status: ClientStatus, follow_up: Option<Date>) -> Client {
        let now = Utc::now();
        Client {
            id: 1,
            company_name: "Northwind Builders".to_string(),
            contact_name: Some("Dana Reyes".to_string()),
            email: Some("dana@northwind.test".to_string()),
            phone: None,
            address: None,
            city: Some("Tacoma".to_string()),
            state: Some("WA".to_string()),
            postal_code: None,
            industry: Some("residential".to_string()),
            status,
            source: Some(ClientSource::Referral),
            rating: Some(4),
            estimated_value: Some(Money::new(82_500_00, 2)),
            tags: vec![],
            notes: None,
            last_contact_date: None,
            next_follow_up_date: follow_up,
            assigned_to: Some(2),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn field_table_matches_row() {
        check_field_table(CLIENT_FIELDS).unwrap();
        let row = serde_json::to_value(sample(ClientStatus::Lead, None)).unwrap();
        assert_eq!(row.as_object().unwrap().len(), CLIENT_FIELDS.len());
    }

    #[test]
    fn view_round_trip() {
        let client = sample(ClientStatus::Opportunity, None);
        assert_eq!(Client::from(ClientView::from(client.clone())), client);
    }

    #[test]
    fn follow_up_overdue_ignores_closed_clients() {
        let yesterday = (Utc::now() - Duration::days(1)).date_naive();
        assert!(ClientView::from(sample(ClientStatus::Lead, Some(yesterday))).follow_up_overdue);
        assert!(!ClientView::from(sample(ClientStatus::Lost, Some(yesterday))).follow_up_overdue);
        assert!(!ClientView::from(sample(ClientStatus::Lead, None)).follow_up_overdue);
    }
}
