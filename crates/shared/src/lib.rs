pub mod domain;
pub mod error;
pub mod protocol;
pub mod time;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
