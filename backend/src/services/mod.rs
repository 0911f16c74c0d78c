pub mod command_service;
pub mod engine;
pub mod job_runner;
pub mod job_store;
pub mod presets;
pub mod prober;
pub mod profiles;
