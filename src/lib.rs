pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod output;
pub mod playback;
pub mod status;
pub mod summary;
pub mod tasks;
pub mod view;
