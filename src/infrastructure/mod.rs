pub mod config;
pub mod llm_clients;
pub mod logging;
pub mod response;
pub mod security;
pub mod storage;
