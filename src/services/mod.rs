pub mod gateway_service;
pub mod memory_store;
pub mod object_store;
pub mod oss_store;
