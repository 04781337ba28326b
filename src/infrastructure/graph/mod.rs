//! Microsoft Graph adapter.

mod client;
mod dto;

pub use client::GraphClient;
