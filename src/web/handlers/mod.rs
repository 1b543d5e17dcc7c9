//! # Web API Handlers

pub mod health;
pub mod tasks;
pub mod webhook;
