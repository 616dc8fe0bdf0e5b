//! Customer domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use kirana_core::{CustomerId, Email};

/// A registered storefront customer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub email: Email,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The customer a request is authenticated as.
///
/// Produced by the bearer token extractor; carries what handlers need for
/// ownership checks and logging without another query.
#[derive(Debug, Clone)]
pub struct CurrentCustomer {
    pub id: CustomerId,
    pub email: Email,
}
