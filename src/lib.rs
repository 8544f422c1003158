pub mod app;
pub mod auth;
pub mod changes;
pub mod config;
pub mod entries;
pub mod error;
pub mod goals;
pub mod helpers;
pub mod products;
pub mod service;
pub mod state;
pub mod view;
