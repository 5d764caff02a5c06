// The infra module contains implementations of core traits plus the
// process-level plumbing (config loading, keep-alive endpoint).

#[path = "reaction_roles/mod.rs"]
pub mod reaction_roles;

#[path = "config/env_config.rs"]
pub mod config;

#[path = "keep_alive/http_server.rs"]
pub mod keep_alive;
