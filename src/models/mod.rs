mod address;
mod customer;
mod invoice;
mod payment;
mod project;
mod service;
mod vacation;
mod work_entry;
mod worker;

pub use address::Address;
pub use customer::{Customer, CustomerKind};
pub use invoice::{Invoice, InvoiceStatus};
pub use payment::{Payment, PaymentStatus};
pub use project::{Project, ProjectStatus};
pub use service::Service;
pub use vacation::Vacation;
pub use work_entry::WorkEntry;
pub use worker::Worker;
