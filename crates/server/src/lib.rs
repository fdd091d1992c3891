pub mod bootstrap;
pub mod customers;
pub mod health;
pub mod service;

pub use bootstrap::{app_router, bootstrap, bootstrap_with_config, Application, BootstrapError};
pub use service::CustomerService;
