pub mod config;
pub mod error;
pub mod listing;
pub mod recipes;
pub mod search;
pub mod upload;
