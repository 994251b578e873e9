pub mod mock_customer_repository;
pub mod mock_job_scheduler;
pub mod mock_notifier;

#[allow(unused_imports)]
pub use mock_customer_repository::MockCustomerRepository;
#[allow(unused_imports)]
pub use mock_job_scheduler::MockJobScheduler;
#[allow(unused_imports)]
pub use mock_notifier::MockNotifier;
