//! Headless client for the logistics record categories: list and inspect
//! records, edit their spreadsheet attachments, and manage records.

pub mod commands;
pub mod config;
pub mod render;
