// src/models/mod.rs

pub mod bookmark;
pub mod follow;
pub mod notification;
pub mod prompt;
pub mod rating;
pub mod user;
