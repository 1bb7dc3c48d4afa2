//! HTTP route handlers

pub mod insights;
pub mod items;
pub mod review;
pub mod schedule;
