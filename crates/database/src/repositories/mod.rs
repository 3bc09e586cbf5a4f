pub mod clients;
pub mod intakes;
pub mod invitations;
pub mod projects;
pub mod users;
pub mod workspaces;
