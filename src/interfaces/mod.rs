pub mod components;
pub mod dashboard;
pub mod tui;
pub mod view_models;
