// Core announcement module - throttled direct-message delivery.

pub mod announcement_models;
pub mod broadcast_service;

pub use announcement_models::*;
pub use broadcast_service::*;
