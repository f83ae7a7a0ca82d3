//! Runtime module: process lifecycle: logging, config boot, run.

pub mod boot;
pub mod run;
