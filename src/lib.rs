pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod kaggle;
pub mod locate;
pub mod output;
pub mod relocate;
pub mod unpack;
