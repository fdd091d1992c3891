use std::sync::Arc;

use clientele_core::clock::Clock;
use clientele_core::domain::customer::{
    Customer, CustomerDraft, CustomerId, CustomerLookup, CustomerView,
};
use clientele_core::errors::ApplicationError;
use clientele_db::repositories::CustomerRepository;
use tracing::info;

/// Customer operations shared by every HTTP handler.
///
/// Responses are projected through [`CustomerService::to_view`] so the tier is always derived
/// against the injected clock rather than stored.
#[derive(Clone)]
pub struct CustomerService {
    repository: Arc<dyn CustomerRepository>,
    clock: Arc<dyn Clock>,
}

impl CustomerService {
    pub fn new(repository: Arc<dyn CustomerRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub async fn create(&self, draft: CustomerDraft) -> Result<Customer, ApplicationError> {
        let saved = self.repository.save(Customer::from_draft(CustomerId::generate(), draft)).await?;
        info!(
            event_name = "customer.created",
            customer_id = %saved.id,
            "customer record created"
        );
        Ok(saved)
    }

    pub async fn get_by_id(&self, id: CustomerId) -> Result<Customer, ApplicationError> {
        let found = self.repository.find_by_id(&id).await?;
        found.ok_or(ApplicationError::NotFound(CustomerLookup::Id(id)))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Customer, ApplicationError> {
        let found = self.repository.find_by_name(name).await?;
        found.ok_or_else(|| ApplicationError::NotFound(CustomerLookup::Name(name.to_owned())))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Customer, ApplicationError> {
        let found = self.repository.find_by_email(email).await?;
        found.ok_or_else(|| ApplicationError::NotFound(CustomerLookup::Email(email.to_owned())))
    }

    /// Full replacement: absent optional attributes in `draft` clear the stored values.
    pub async fn update(
        &self,
        id: CustomerId,
        draft: CustomerDraft,
    ) -> Result<Customer, ApplicationError> {
        let mut existing = self.get_by_id(id).await?;
        existing.replace_attributes(draft);
        let saved = self.repository.save(existing).await?;
        info!(
            event_name = "customer.updated",
            customer_id = %saved.id,
            "customer record replaced"
        );
        Ok(saved)
    }

    pub async fn delete(&self, id: CustomerId) -> Result<(), ApplicationError> {
        let existing = self.get_by_id(id).await?;
        self.repository.delete(&existing).await?;
        info!(event_name = "customer.deleted", customer_id = %id, "customer record deleted");
        Ok(())
    }

    pub fn to_view(&self, customer: Customer) -> CustomerView {
        CustomerView::project(customer, self.clock.now())
    }
}
