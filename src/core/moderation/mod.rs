// Core moderation module - rules behind kick/ban/timeout.
// The Discord layer only translates these into API calls.

pub mod moderation_models;
pub mod moderation_service;

pub use moderation_models::*;
pub use moderation_service::*;
