use async_trait::async_trait;
use chrono::NaiveDate;
use followup_tracker::error::{StoreError, StoreResult};
use followup_tracker::models::Customer;
use followup_tracker::repositories::CustomerRepository;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock customer repository for testing.
///
/// In-memory implementation of CustomerRepository that tracks method calls
/// and can be switched into a mode where every call fails.
#[allow(dead_code)]
#[derive(Clone)]
pub struct MockCustomerRepository {
    customers: Arc<Mutex<HashMap<String, Customer>>>,
    call_counts: Arc<Mutex<HashMap<String, usize>>>,
    failing: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockCustomerRepository {
    pub fn new() -> Self {
        Self {
            customers: Arc::new(Mutex::new(HashMap::new())),
            call_counts: Arc::new(Mutex::new(HashMap::new())),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn add_customer(&self, customer: Customer) {
        let mut customers = self.customers.lock().unwrap();
        customers.insert(customer.id.clone(), customer);
    }

    /// Make every subsequent call return `StoreError::Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn get_call_count(&self, method: &str) -> usize {
        let counts = self.call_counts.lock().unwrap();
        *counts.get(method).unwrap_or(&0)
    }

    fn track_call(&self, method: &str) -> StoreResult<()> {
        let mut counts = self.call_counts.lock().unwrap();
        *counts.entry(method.to_string()).or_insert(0) += 1;

        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("mock store offline".to_string()));
        }
        Ok(())
    }
}

impl Default for MockCustomerRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CustomerRepository for MockCustomerRepository {
    async fn get(&self, id: &str) -> StoreResult<Customer> {
        self.track_call("get")?;

        let customers = self.customers.lock().unwrap();
        customers
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("customer {}", id)))
    }

    async fn list(&self) -> StoreResult<Vec<Customer>> {
        self.track_call("list")?;

        let customers = self.customers.lock().unwrap();
        let mut result: Vec<Customer> = customers.values().cloned().collect();
        result.sort_by(|a, b| {
            a.promise_date
                .cmp(&b.promise_date)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(result)
    }

    async fn list_for_date(&self, date: NaiveDate) -> StoreResult<Vec<Customer>> {
        self.track_call("list_for_date")?;

        let customers = self.customers.lock().unwrap();
        let mut result: Vec<Customer> = customers
            .values()
            .filter(|c| c.is_due_on(date))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    async fn search(&self, query: &str) -> StoreResult<Vec<Customer>> {
        self.track_call("search")?;

        let query_lower = query.to_lowercase();
        let customers = self.customers.lock().unwrap();
        Ok(customers
            .values()
            .filter(|c| {
                c.name.to_lowercase().contains(&query_lower) || c.phone_number.contains(query)
            })
            .cloned()
            .collect())
    }

    async fn create(&self, customer: &Customer) -> StoreResult<Customer> {
        self.track_call("create")?;

        let mut customers = self.customers.lock().unwrap();
        if customers.contains_key(&customer.id) {
            return Err(StoreError::AlreadyExists(customer.id.clone()));
        }
        customers.insert(customer.id.clone(), customer.clone());
        Ok(customer.clone())
    }

    async fn update(&self, customer: &Customer) -> StoreResult<Customer> {
        self.track_call("update")?;

        let mut customers = self.customers.lock().unwrap();
        match customers.get_mut(&customer.id) {
            Some(existing) => {
                *existing = customer.clone();
                Ok(customer.clone())
            }
            None => Err(StoreError::NotFound(format!("customer {}", customer.id))),
        }
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.track_call("delete")?;

        let mut customers = self.customers.lock().unwrap();
        customers
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("customer {}", id)))
    }

    async fn upsert_all(&self, customers_list: &[Customer]) -> StoreResult<usize> {
        self.track_call("upsert_all")?;

        let mut customers = self.customers.lock().unwrap();
        for customer in customers_list {
            customers.insert(customer.id.clone(), customer.clone());
        }
        Ok(customers_list.len())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.track_call("clear")?;

        self.customers.lock().unwrap().clear();
        Ok(())
    }
}
