pub mod bed_config;
pub mod booking;
pub mod property;
