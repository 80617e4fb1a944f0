pub mod prelude;

pub mod activities;
pub mod group_files;
pub mod group_memberships;
pub mod groups;
pub mod users;
