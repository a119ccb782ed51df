// src/lib.rs

pub mod client;
pub mod config;
pub mod error;
pub mod grading;
pub mod models;
pub mod page;

pub use client::{HttpClient, PortalApi};
pub use grading::GradingWorkflow;
