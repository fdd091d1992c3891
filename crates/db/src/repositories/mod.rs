use async_trait::async_trait;
use thiserror::Error;

use clientele_core::domain::customer::{Customer, CustomerId};
use clientele_core::errors::ApplicationError;

pub mod customer;
pub mod memory;

pub use customer::SqlCustomerRepository;
pub use memory::InMemoryCustomerRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        Self::Persistence(value.to_string())
    }
}

/// Storage for customer records.
///
/// Name and email are not unique; when several records match, the one stored first is
/// returned.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Inserts or fully replaces the record with `customer.id` and returns the stored state.
    async fn save(&self, customer: Customer) -> Result<Customer, RepositoryError>;
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Customer>, RepositoryError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, RepositoryError>;
    async fn delete(&self, customer: &Customer) -> Result<(), RepositoryError>;
}
