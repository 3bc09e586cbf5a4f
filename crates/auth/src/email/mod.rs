pub mod service;
pub mod templates;

pub use service::{EmailMessage, EmailProvider, EmailService};
