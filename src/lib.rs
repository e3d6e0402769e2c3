pub mod cache;
pub mod catalog;
pub mod commands;
pub mod package;
pub mod registry;
pub mod runtime;
pub mod selection;
