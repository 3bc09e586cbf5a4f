pub mod client;
pub mod intake;
pub mod invitation;
pub mod project;
pub mod user;
pub mod view;
pub mod workspace;

// Re-export commonly used types
pub use client::{Client, NewClient};
pub use intake::{ClientIntake, IntakeFields, IntakeSource, IntakeStatus, NewIntake};
pub use invitation::{CreateInvitation, Invitation, InvitationRole, NewInvitation};
pub use project::{Project, ProjectMember, Task};
pub use user::{name_from_email, GlobalRole, NewUser, User, UserView};
pub use view::{ProjectMemberView, ProjectView, TaskView, WorkspaceMemberView, WorkspaceView};
pub use workspace::{
    CreateWorkspace, NewWorkspace, UpdateWorkspace, Workspace, WorkspaceMember, WorkspaceRole,
};
