pub mod carriers;
pub mod config;
pub mod run;
