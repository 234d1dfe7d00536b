pub mod admin;
pub mod app;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod flash;
pub mod logging;
pub mod mail;
pub mod orders;
pub mod quotes;
pub mod shop;
pub mod state;
pub mod views;

#[cfg(test)]
mod test_support;
