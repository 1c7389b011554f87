//! PaperFlow - contract notes and policy acknowledgment tracking
//!
//! This crate ties the pieces together:
//! - `Settings`: config file and environment loading
//! - `startup`: logging and wiring to the hosted backend
//! - `PaperflowApp`: opens a workspace for whoever is signed in

pub mod app;
pub mod settings;
pub mod startup;

pub use app::PaperflowApp;
pub use settings::Settings;
