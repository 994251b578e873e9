//! Customer service layer.
//!
//! Business logic for adding, editing and removing customers and for logging
//! the calls made to them.

use crate::clock::Clock;
use crate::domain::{PhoneNumber, ValidationError};
use crate::error::{ServiceResult, StoreError};
use crate::models::{Customer, CustomerWithFollowUps, FollowUp, SortOption};
use crate::repositories::{CustomerRepository, FollowUpRepository};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

/// Input for a new customer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    pub name: String,
    pub phone_number: String,
    pub amount: f64,
    pub promise_date: NaiveDate,
    pub notes: String,
}

/// Customer service trait for business operations.
#[async_trait]
pub trait CustomerService: Send + Sync {
    async fn add_customer(&self, new: NewCustomer) -> ServiceResult<Customer>;

    /// Save edits to an existing customer.
    ///
    /// The stored id and creation time win over whatever `customer` carries.
    async fn update_customer(&self, customer: Customer) -> ServiceResult<Customer>;

    /// Delete a customer and their follow-ups. Returns how many follow-ups went.
    async fn delete_customer(&self, id: &str) -> ServiceResult<usize>;

    /// Record a call. A `next_promise_date` also moves the customer's promise.
    async fn log_call(
        &self,
        customer_id: &str,
        notes: &str,
        next_promise_date: Option<NaiveDate>,
    ) -> ServiceResult<FollowUp>;

    /// Correct a logged call's notes or next date. The call time is kept.
    async fn update_follow_up(&self, follow_up: FollowUp) -> ServiceResult<FollowUp>;

    async fn delete_follow_up(&self, id: &str) -> ServiceResult<()>;

    async fn customers_due_on(&self, date: NaiveDate) -> ServiceResult<Vec<Customer>>;

    async fn sorted_customers(&self, sort: SortOption) -> ServiceResult<Vec<CustomerWithFollowUps>>;

    async fn search(&self, query: &str) -> ServiceResult<Vec<Customer>>;

    async fn customer_with_follow_ups(&self, id: &str) -> ServiceResult<CustomerWithFollowUps>;
}

/// Default implementation of CustomerService.
pub struct CustomerServiceImpl {
    customers: Arc<dyn CustomerRepository>,
    follow_ups: Arc<dyn FollowUpRepository>,
    clock: Arc<dyn Clock>,
}

/// Validation helper functions.
impl CustomerServiceImpl {
    fn validate_name(name: &str) -> Result<(), ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::Empty("Name"));
        }
        Ok(())
    }

    fn validate_phone(phone: &str) -> Result<(), ValidationError> {
        if phone.trim().is_empty() {
            return Err(ValidationError::Empty("Phone number"));
        }
        PhoneNumber::new(phone).map(|_| ())
    }

    fn validate_amount(amount: f64) -> Result<(), ValidationError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ValidationError::InvalidAmount(amount.to_string()));
        }
        Ok(())
    }

    fn validate(name: &str, phone: &str, amount: f64) -> Result<(), ValidationError> {
        Self::validate_name(name)?;
        Self::validate_phone(phone)?;
        Self::validate_amount(amount)
    }
}

impl CustomerServiceImpl {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        follow_ups: Arc<dyn FollowUpRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            customers,
            follow_ups,
            clock,
        }
    }
}

#[async_trait]
impl CustomerService for CustomerServiceImpl {
    async fn add_customer(&self, new: NewCustomer) -> ServiceResult<Customer> {
        Self::validate(&new.name, &new.phone_number, new.amount)?;

        let mut customer = Customer::new(
            new.name.trim(),
            new.phone_number.trim(),
            new.amount,
            new.promise_date,
            self.clock.now_millis(),
        );
        customer.notes = new.notes;

        let created = self.customers.create(&customer).await?;
        info!(id = %created.id, promise_date = %created.promise_date, "Added customer");
        Ok(created)
    }

    async fn update_customer(&self, mut customer: Customer) -> ServiceResult<Customer> {
        Self::validate(&customer.name, &customer.phone_number, customer.amount)?;

        let stored = self.customers.get(&customer.id).await?;
        customer.created_at = stored.created_at;
        customer.updated_at = stored.updated_at;
        customer.touch(self.clock.now_millis());

        Ok(self.customers.update(&customer).await?)
    }

    async fn delete_customer(&self, id: &str) -> ServiceResult<usize> {
        // Make sure it exists before touching follow-ups.
        self.customers.get(id).await?;

        let removed = self.follow_ups.delete_for_customer(id).await?;
        self.customers.delete(id).await?;

        info!(id, follow_ups = removed, "Deleted customer");
        Ok(removed)
    }

    async fn log_call(
        &self,
        customer_id: &str,
        notes: &str,
        next_promise_date: Option<NaiveDate>,
    ) -> ServiceResult<FollowUp> {
        let mut customer = self.customers.get(customer_id).await?;
        let now = self.clock.now_millis();

        let follow_up = FollowUp::new(customer_id, notes.trim(), next_promise_date, now);
        let created = self.follow_ups.create(&follow_up).await?;

        if let Some(date) = next_promise_date {
            customer.promise_date = date;
            customer.touch(now);
            self.customers.update(&customer).await?;
        }

        info!(customer_id, next_promise_date = ?next_promise_date, "Logged call");
        Ok(created)
    }

    async fn update_follow_up(&self, mut follow_up: FollowUp) -> ServiceResult<FollowUp> {
        let stored = self
            .follow_ups
            .list_for_customer(&follow_up.customer_id)
            .await?
            .into_iter()
            .find(|f| f.id == follow_up.id)
            .ok_or_else(|| StoreError::NotFound(format!("follow-up {}", follow_up.id)))?;

        follow_up.notes = follow_up.notes.trim().to_string();
        follow_up.timestamp = stored.timestamp;
        Ok(self.follow_ups.update(&follow_up).await?)
    }

    async fn delete_follow_up(&self, id: &str) -> ServiceResult<()> {
        self.follow_ups.delete(id).await?;
        info!(id, "Deleted follow-up");
        Ok(())
    }

    async fn customers_due_on(&self, date: NaiveDate) -> ServiceResult<Vec<Customer>> {
        Ok(self.customers.list_for_date(date).await?)
    }

    async fn sorted_customers(&self, sort: SortOption) -> ServiceResult<Vec<CustomerWithFollowUps>> {
        let mut result = Vec::new();
        for customer in self.customers.list().await? {
            let follow_ups = self.follow_ups.list_for_customer(&customer.id).await?;
            result.push(CustomerWithFollowUps {
                customer,
                follow_ups,
            });
        }
        sort.sort(&mut result);
        Ok(result)
    }

    async fn search(&self, query: &str) -> ServiceResult<Vec<Customer>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(self.customers.list().await?);
        }
        Ok(self.customers.search(query).await?)
    }

    async fn customer_with_follow_ups(&self, id: &str) -> ServiceResult<CustomerWithFollowUps> {
        let customer = self.customers.get(id).await?;
        let follow_ups = self.follow_ups.list_for_customer(id).await?;
        Ok(CustomerWithFollowUps {
            customer,
            follow_ups,
        })
    }
}
