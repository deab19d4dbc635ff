pub mod auth_cmd;
pub mod common;
pub mod create;
pub mod delete;
pub mod favorite;
pub mod list;
pub mod search;
pub mod show;
pub mod status;
pub mod sync;
pub mod update;
