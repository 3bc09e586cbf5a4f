pub mod connection;
pub mod error;
pub mod memory;
mod postgres;
pub mod repositories;
pub mod store;

pub use connection::{Database, DatabaseConfig};
pub use error::{DatabaseError, Result};
pub use memory::MemoryStore;
pub use repositories::{
    clients::ClientRepository, intakes::IntakeRepository, invitations::InvitationRepository,
    projects::ProjectRepository, users::UserRepository, workspaces::WorkspaceRepository,
};
pub use store::{
    AcceptOutcome, AccountResolution, DynIdentityStore, DynTenantStore, IdentityStore,
    IntakeSubmission, InvitationAcceptance, TenantStore,
};
