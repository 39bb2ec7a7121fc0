// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod bookmark;
pub mod follow;
pub mod notification;
pub mod profile;
pub mod prompt;
pub mod rating;
