// Core ticket module - inactivity-based closing of support ticket channels.

pub mod ticket_models;
pub mod ticket_monitor;

pub use ticket_models::*;
pub use ticket_monitor::*;
