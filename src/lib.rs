pub mod config;
pub mod dialog;
pub mod domain;
pub mod mail_relay;
mod routes;
mod startup;
pub mod telemetry;
mod util;

pub use startup::run;
