//! Management tooling for the BioWave test database

pub mod commands;
pub mod output;
