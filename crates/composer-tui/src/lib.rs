pub mod app;
pub mod cli;
pub mod logging;
pub mod mentions;
pub mod runtime;
pub mod settings;
pub mod slash;
pub mod ui;
