pub mod common;
pub mod provider;
pub mod runtime;
pub mod scan;
pub mod transfer;
pub mod ui;
