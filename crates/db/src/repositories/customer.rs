use std::str::FromStr;

use chrono::DateTime;
use rust_decimal::Decimal;
use sqlx::Row;
use tracing::warn;
use uuid::Uuid;

use clientele_core::domain::customer::{Customer, CustomerId};

use super::{CustomerRepository, RepositoryError};
use crate::DbPool;

const SELECT_CUSTOMER: &str =
    "SELECT id, name, email, annual_spend, last_purchase_date FROM customer";

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn find_first_where(
        &self,
        column: &'static str,
        value: &str,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query(&format!(
            "{SELECT_CUSTOMER} WHERE {column} = ? ORDER BY rowid ASC LIMIT 1"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_customer).transpose().inspect_err(|error| {
            warn!(
                event_name = "db.customer.decode_failed",
                lookup_column = column,
                error = %error,
                "stored customer row could not be decoded"
            );
        })
    }
}

fn decode_error(error: impl ToString) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

fn row_to_customer(row: &sqlx::sqlite::SqliteRow) -> Result<Customer, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_error)?;
    let name: String = row.try_get("name").map_err(decode_error)?;
    let email: String = row.try_get("email").map_err(decode_error)?;
    let annual_spend: Option<String> = row.try_get("annual_spend").map_err(decode_error)?;
    let last_purchase_date: Option<String> =
        row.try_get("last_purchase_date").map_err(decode_error)?;

    let id = Uuid::parse_str(&id)
        .map_err(|error| decode_error(format!("customer id `{id}`: {error}")))?;
    let annual_spend = annual_spend
        .map(|raw| {
            Decimal::from_str(&raw)
                .map_err(|error| decode_error(format!("annual_spend `{raw}`: {error}")))
        })
        .transpose()?;
    let last_purchase_date = last_purchase_date
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map_err(|error| decode_error(format!("last_purchase_date `{raw}`: {error}")))
        })
        .transpose()?;

    Ok(Customer { id: CustomerId(id), name, email, annual_spend, last_purchase_date })
}

#[async_trait::async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn save(&self, customer: Customer) -> Result<Customer, RepositoryError> {
        let annual_spend = customer.annual_spend.map(|spend| spend.to_string());
        let last_purchase_date = customer.last_purchase_date.map(|date| date.to_rfc3339());

        sqlx::query(
            "INSERT INTO customer (id, name, email, annual_spend, last_purchase_date)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 email = excluded.email,
                 annual_spend = excluded.annual_spend,
                 last_purchase_date = excluded.last_purchase_date",
        )
        .bind(customer.id.0.to_string())
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&annual_spend)
        .bind(&last_purchase_date)
        .execute(&self.pool)
        .await?;

        self.find_by_id(&customer.id).await?.ok_or_else(|| {
            RepositoryError::Decode(format!("customer `{}` missing after save", customer.id))
        })
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        self.find_first_where("id", &id.0.to_string()).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Customer>, RepositoryError> {
        self.find_first_where("name", name).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, RepositoryError> {
        self.find_first_where("email", email).await
    }

    async fn delete(&self, customer: &Customer) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM customer WHERE id = ?")
            .bind(customer.id.0.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
