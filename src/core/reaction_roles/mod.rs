// Core reaction-role module - self-service role assignment through reactions.
// Same split as the other core modules: models + service with its ports.

pub mod reaction_role_models;
pub mod reaction_role_service;

pub use reaction_role_models::*;
pub use reaction_role_service::*;
