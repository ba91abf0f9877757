// src/handlers/mod.rs

pub mod users;
