// Workspace-scoped request context and the workspace read-model

pub mod compose;
pub mod context;
pub mod error;
pub mod extractor;
pub mod workspace;

pub use compose::WorkspaceComposer;
pub use context::WorkspaceContext;
pub use error::{Result, TenantError};
pub use extractor::{workspace_id_from_parts, WorkspaceRejection, WORKSPACE_HEADER};
pub use workspace::WorkspaceService;
