pub mod postgres_service;
pub mod redis_manager;
pub mod repository;

pub use postgres_service::DatabaseService;
pub use redis_manager::RedisService;
