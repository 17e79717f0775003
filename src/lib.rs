pub mod agent;
pub mod debate;
pub mod errors;
pub mod group;
pub mod prompts;
pub mod providers;
