#![doc = "The `todo_gate` library crate."]
#![doc = ""]
#![doc = "A multi-user todo service whose private routes sit behind a gate that accepts a"]
#![doc = "request only when its bearer token verifies and a live session row exists for it."]
#![doc = "The binary (`main.rs`) wires configuration, the database pool and the gate into"]
#![doc = "an actix-web server."]

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod routes;

pub use crate::error::AppError;
