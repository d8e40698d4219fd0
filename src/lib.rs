//! pavement-entry
//!
//! Enters pavement sections from a spreadsheet into a StreetSaver-style web
//! application by driving Chromium, resolving free-text values to dropdown
//! options by edit-distance similarity.

pub mod audit;
pub mod browser;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod processor;
pub mod report;
pub mod resilient;
pub mod site;
pub mod spreadsheet;
pub mod workbook;

pub use controller::{RunController, RunSettings, RunSummary};
pub use error::{EntryError, Result};
