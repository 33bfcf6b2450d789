//! Background Tasks Module
//!
//! Contains background tasks that run alongside the host server.
//!
//! # Tasks
//! - Registration: installs and activates the configured worker version

mod registration;

pub use registration::spawn_registration_task;
