pub mod config;
pub mod email;
pub mod error;
pub mod intake;
pub mod invitation;
pub mod jwt;
pub mod notifier;
pub mod password;
pub mod service;
pub mod token;
pub mod webhook;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use config::OnboardingConfig;
pub use email::{EmailMessage, EmailProvider, EmailService};
pub use error::{AuthError, NotifyError, Result};
pub use intake::{CreateIntake, IntakeContext, IntakeService, IssuedIntake, SubmittedIntake};
pub use invitation::{
    AcceptInvitation, AcceptedInvitation, InvitationDetails, InvitationService, IssuedInvitation,
};
pub use jwt::{Claims, JwtService};
pub use notifier::{DeliveryNotifier, DynNotifier, InvitationEmail, Notifier};
pub use password::PasswordHasher;
pub use service::{AuthService, LoginRequest, LoginResponse};
pub use webhook::{WebhookClient, WebhookConfig};
