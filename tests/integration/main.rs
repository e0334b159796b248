//! Integration tests

mod cli_test;
mod flashback_test;
mod helpers;
mod properties_test;
mod scenarios_test;
