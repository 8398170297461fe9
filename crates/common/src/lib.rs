pub mod actors;
pub mod config;
pub mod demo;
pub mod logger;
pub mod models;
