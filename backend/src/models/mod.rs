// src/models/mod.rs

pub mod user;
