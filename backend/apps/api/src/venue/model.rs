//! Venue data models

use chrono::{DateTime, Utc};
use kernel::error::app_error::{AppError, AppResult, FieldError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MAX_NAME_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub customer_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// POST /api/customers body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl NewCustomer {
    /// Collect every field problem at once
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(FieldError::new("name", "required", "Name is required"));
        } else if name.chars().count() > MAX_NAME_LEN {
            errors.push(FieldError::new("name", "too_long", "Name must be at most 200 characters"));
        }

        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
            _ => errors.push(
                FieldError::new("email", "invalid_email", "Email is malformed").with_value(email),
            ),
        }

        if let Some(phone) = &self.phone {
            let valid = phone
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
            if !valid {
                errors.push(
                    FieldError::new("phone", "invalid_phone", "Phone contains invalid characters")
                        .with_value(phone.clone()),
                );
            }
        }

        if errors.is_empty() {
            return Ok(());
        }

        Err(errors
            .into_iter()
            .fold(AppError::validation("Invalid customer"), AppError::with_field_error))
    }

    /// Build the stored record
    pub fn into_customer(self) -> Customer {
        Customer {
            customer_id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_ascii_lowercase(),
            phone: self.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub item_id: Uuid,
    pub sku: String,
    pub name: String,
    pub quantity: i32,
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RoyaltyStatement {
    pub statement_id: Uuid,
    pub artist_name: String,
    pub period: String,
    pub amount_cents: i64,
    pub status: String,
}
