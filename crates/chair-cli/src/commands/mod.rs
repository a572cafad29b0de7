pub mod auth;
pub mod dispatch;
pub mod refresh;
pub mod roles;

mod view;
