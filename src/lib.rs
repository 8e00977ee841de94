//! socdash: terminal console for a social media automation backend

pub mod app;
pub mod config;
pub mod core;
pub mod infrastructure;
pub mod modules;
pub mod ui;
