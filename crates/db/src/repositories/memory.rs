use tokio::sync::RwLock;

use clientele_core::domain::customer::{Customer, CustomerId};

use super::{CustomerRepository, RepositoryError};

/// Insertion-ordered store; replaced records keep their original position.
#[derive(Default)]
pub struct InMemoryCustomerRepository {
    customers: RwLock<Vec<Customer>>,
}

impl InMemoryCustomerRepository {
    async fn find_first(&self, matches: impl Fn(&Customer) -> bool) -> Option<Customer> {
        let customers = self.customers.read().await;
        customers.iter().find(|customer| matches(customer)).cloned()
    }
}

#[async_trait::async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn save(&self, customer: Customer) -> Result<Customer, RepositoryError> {
        let mut customers = self.customers.write().await;
        match customers.iter_mut().find(|existing| existing.id == customer.id) {
            Some(existing) => *existing = customer.clone(),
            None => customers.push(customer.clone()),
        }
        Ok(customer)
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        Ok(self.find_first(|customer| customer.id == *id).await)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Customer>, RepositoryError> {
        Ok(self.find_first(|customer| customer.name == name).await)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, RepositoryError> {
        Ok(self.find_first(|customer| customer.email == email).await)
    }

    async fn delete(&self, customer: &Customer) -> Result<(), RepositoryError> {
        let mut customers = self.customers.write().await;
        customers.retain(|existing| existing.id != customer.id);
        Ok(())
    }
}
