pub mod config;
pub mod error;
pub mod executor;
pub mod operation;
pub mod report;
pub mod runner;
pub mod state;

#[cfg(test)]
mod testing;
