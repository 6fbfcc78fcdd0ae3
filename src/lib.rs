//! USSD engine: session handling and menu navigation for the YouthConnect
//! feature-phone channel.

pub mod config;
pub mod error;
pub mod gateway;
pub mod handler;
pub mod input;
pub mod menu;
pub mod reply;
pub mod routes;
pub mod session;
