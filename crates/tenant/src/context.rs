// Per-request workspace selection. The workspace is always explicit, never
// ambient server state.

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkspaceContext {
    pub workspace_id: Uuid,
}

impl WorkspaceContext {
    pub fn new(workspace_id: Uuid) -> Self {
        Self { workspace_id }
    }
}
