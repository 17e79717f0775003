pub mod base;
pub mod configs;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod openai;
pub mod types;
pub mod utils;
