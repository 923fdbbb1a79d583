pub mod actor;
pub mod dispatch;
pub mod settings;
