pub mod error;
pub mod resolver;

pub use error::{AuthzError, Result};
pub use resolver::{resolve_access, AuthorizationResolver, WorkspaceAccess};
