pub use super::activities::Entity as Activities;
pub use super::group_files::Entity as GroupFiles;
pub use super::group_memberships::Entity as GroupMemberships;
pub use super::groups::Entity as Groups;
pub use super::users::Entity as Users;
