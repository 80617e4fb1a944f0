pub mod access;
pub mod activity;
pub mod file_service;
pub mod group_service;
pub mod storage;
pub mod user_service;
