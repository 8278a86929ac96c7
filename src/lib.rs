pub mod cli;
pub mod config;
pub mod contribute;
pub mod error;
pub mod form;
pub mod geocoder;
pub mod geolocation;
pub mod loader;
pub mod notify;
pub mod scanner;
