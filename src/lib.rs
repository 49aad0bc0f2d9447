pub mod config;
pub mod date_picker;
pub mod db;
pub mod error;
pub mod flow;
pub mod handlers;
pub mod models;
pub mod payment;
pub mod pricing;
pub mod rooms;
pub mod search;
pub mod state;
