pub mod command_service;
pub mod render;
pub mod session_loop;
