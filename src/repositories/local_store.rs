//! Record store kept in memory, optionally mirrored to a JSON file.

use crate::error::{StoreError, StoreResult};
use crate::models::{Customer, FollowUp, NotificationTime};
use crate::repositories::traits::{CustomerRepository, FollowUpRepository, PreferencesRepository};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Everything the store holds, as written to disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreSnapshot {
    #[serde(default)]
    customers: BTreeMap<String, Customer>,
    #[serde(default)]
    follow_ups: BTreeMap<String, FollowUp>,
    /// `None` until the user (or the defaults) saved a list
    #[serde(default)]
    notification_times: Option<Vec<NotificationTime>>,
}

/// Customers, follow-ups and preferences behind one lock.
///
/// Built with [`LocalStore::in_memory`] it never touches disk. Built with
/// [`LocalStore::open`] every mutation rewrites a JSON snapshot at the given
/// path (written to a temporary file, then renamed over the old one). A
/// mutation whose write fails is undone before the error is returned.
#[derive(Clone)]
pub struct LocalStore {
    state: Arc<RwLock<StoreSnapshot>>,
    path: Option<PathBuf>,
    persist_lock: Arc<tokio::sync::Mutex<()>>,
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("store lock poisoned".to_string())
}

impl LocalStore {
    /// An empty store that lives only in memory.
    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreSnapshot::default())),
            path: None,
            persist_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Load the snapshot at `path`, or start empty if the file does not exist.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => StoreSnapshot::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreSnapshot::default(),
            Err(e) => return Err(e.into()),
        };

        info!(
            path = %path.display(),
            customers = snapshot.customers.len(),
            follow_ups = snapshot.follow_ups.len(),
            "Opened record store"
        );

        Ok(Self {
            state: Arc::new(RwLock::new(snapshot)),
            path: Some(path),
            persist_lock: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    fn read<T>(&self, f: impl FnOnce(&StoreSnapshot) -> T) -> StoreResult<T> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(f(&state))
    }

    /// Apply `f` and write the result to disk. If the write fails the
    /// change is undone, so memory never runs ahead of the file.
    async fn mutate<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut StoreSnapshot) -> StoreResult<T> + Send,
        T: Send,
    {
        let Some(path) = &self.path else {
            let mut state = self.state.write().map_err(|_| poisoned())?;
            return f(&mut state);
        };

        let _guard = self.persist_lock.lock().await;
        let (out, previous) = {
            let mut state = self.state.write().map_err(|_| poisoned())?;
            let previous = state.clone();
            (f(&mut state)?, previous)
        };

        if let Err(e) = self.persist(path).await {
            *self.state.write().map_err(|_| poisoned())? = previous;
            warn!(path = %path.display(), "Store write failed, change rolled back: {}", e);
            return Err(e);
        }
        Ok(out)
    }

    /// Caller holds `persist_lock`.
    async fn persist(&self, path: &Path) -> StoreResult<()> {
        let bytes = self.read(|s| serde_json::to_vec_pretty(s))??;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await?;

        debug!(path = %path.display(), bytes = bytes.len(), "Persisted record store");
        Ok(())
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[async_trait]
impl CustomerRepository for LocalStore {
    async fn get(&self, id: &str) -> StoreResult<Customer> {
        self.read(|s| s.customers.get(id).cloned())?
            .ok_or_else(|| StoreError::NotFound(format!("customer {}", id)))
    }

    async fn list(&self) -> StoreResult<Vec<Customer>> {
        let mut customers = self.read(|s| s.customers.values().cloned().collect::<Vec<_>>())?;
        customers.sort_by(|a, b| {
            a.promise_date
                .cmp(&b.promise_date)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(customers)
    }

    async fn list_for_date(&self, date: NaiveDate) -> StoreResult<Vec<Customer>> {
        let mut customers = self.read(|s| {
            s.customers
                .values()
                .filter(|c| c.is_due_on(date))
                .cloned()
                .collect::<Vec<_>>()
        })?;
        customers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(customers)
    }

    async fn search(&self, query: &str) -> StoreResult<Vec<Customer>> {
        let needle = query.to_lowercase();
        let mut customers = self.read(|s| {
            s.customers
                .values()
                .filter(|c| {
                    c.name.to_lowercase().contains(&needle)
                        || c.phone_number.to_lowercase().contains(&needle)
                })
                .cloned()
                .collect::<Vec<_>>()
        })?;
        customers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(customers)
    }

    async fn create(&self, customer: &Customer) -> StoreResult<Customer> {
        let customer = customer.clone();
        self.mutate(move |s| {
            if s.customers.contains_key(&customer.id) {
                return Err(StoreError::AlreadyExists(format!("customer {}", customer.id)));
            }
            s.customers.insert(customer.id.clone(), customer.clone());
            Ok(customer)
        })
        .await
    }

    async fn update(&self, customer: &Customer) -> StoreResult<Customer> {
        let customer = customer.clone();
        self.mutate(move |s| match s.customers.get_mut(&customer.id) {
            Some(slot) => {
                *slot = customer.clone();
                Ok(customer)
            }
            None => Err(StoreError::NotFound(format!("customer {}", customer.id))),
        })
        .await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let id = id.to_string();
        self.mutate(move |s| {
            s.customers
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound(format!("customer {}", id)))
        })
        .await
    }

    async fn upsert_all(&self, customers: &[Customer]) -> StoreResult<usize> {
        let customers = customers.to_vec();
        self.mutate(move |s| {
            let count = customers.len();
            for customer in customers {
                s.customers.insert(customer.id.clone(), customer);
            }
            Ok(count)
        })
        .await
    }

    async fn clear(&self) -> StoreResult<()> {
        self.mutate(|s| {
            s.customers.clear();
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl FollowUpRepository for LocalStore {
    async fn list_for_customer(&self, customer_id: &str) -> StoreResult<Vec<FollowUp>> {
        let mut follow_ups = self.read(|s| {
            s.follow_ups
                .values()
                .filter(|f| f.customer_id == customer_id)
                .cloned()
                .collect::<Vec<_>>()
        })?;
        follow_ups.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(follow_ups)
    }

    async fn list_all(&self) -> StoreResult<Vec<FollowUp>> {
        let mut follow_ups = self.read(|s| s.follow_ups.values().cloned().collect::<Vec<_>>())?;
        follow_ups.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(follow_ups)
    }

    async fn count_for_customer(&self, customer_id: &str) -> StoreResult<usize> {
        self.read(|s| {
            s.follow_ups
                .values()
                .filter(|f| f.customer_id == customer_id)
                .count()
        })
    }

    async fn create(&self, follow_up: &FollowUp) -> StoreResult<FollowUp> {
        let follow_up = follow_up.clone();
        self.mutate(move |s| {
            if s.follow_ups.contains_key(&follow_up.id) {
                return Err(StoreError::AlreadyExists(format!("follow-up {}", follow_up.id)));
            }
            s.follow_ups.insert(follow_up.id.clone(), follow_up.clone());
            Ok(follow_up)
        })
        .await
    }

    async fn update(&self, follow_up: &FollowUp) -> StoreResult<FollowUp> {
        let follow_up = follow_up.clone();
        self.mutate(move |s| match s.follow_ups.get_mut(&follow_up.id) {
            Some(slot) => {
                *slot = follow_up.clone();
                Ok(follow_up)
            }
            None => Err(StoreError::NotFound(format!("follow-up {}", follow_up.id))),
        })
        .await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let id = id.to_string();
        self.mutate(move |s| {
            s.follow_ups
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound(format!("follow-up {}", id)))
        })
        .await
    }

    async fn delete_for_customer(&self, customer_id: &str) -> StoreResult<usize> {
        let customer_id = customer_id.to_string();
        self.mutate(move |s| {
            let before = s.follow_ups.len();
            s.follow_ups.retain(|_, f| f.customer_id != customer_id);
            Ok(before - s.follow_ups.len())
        })
        .await
    }

    async fn upsert_all(&self, follow_ups: &[FollowUp]) -> StoreResult<usize> {
        let follow_ups = follow_ups.to_vec();
        self.mutate(move |s| {
            let count = follow_ups.len();
            for follow_up in follow_ups {
                s.follow_ups.insert(follow_up.id.clone(), follow_up);
            }
            Ok(count)
        })
        .await
    }

    async fn clear(&self) -> StoreResult<()> {
        self.mutate(|s| {
            s.follow_ups.clear();
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl PreferencesRepository for LocalStore {
    async fn notification_times(&self) -> StoreResult<Vec<NotificationTime>> {
        if let Some(times) = self.read(|s| s.notification_times.clone())? {
            return Ok(times);
        }

        // Save the defaults so their ids stay stable across calls.
        self.mutate(|s| {
            Ok(s
                .notification_times
                .get_or_insert_with(NotificationTime::defaults)
                .clone())
        })
        .await
    }

    async fn set_notification_times(&self, times: &[NotificationTime]) -> StoreResult<()> {
        let times = times.to_vec();
        self.mutate(move |s| {
            s.notification_times = Some(times);
            Ok(())
        })
        .await
    }
}
