pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod tier;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::customer::{
    Customer, CustomerDraft, CustomerId, CustomerLookup, CustomerRequest, CustomerView,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use tier::{classify, months_between, Tier};
pub use validation::FieldViolation;
