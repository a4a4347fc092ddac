pub mod engine;
pub mod enhancement;
pub mod handlers;
pub mod store;

pub use enhancement::{EnhancementQueue, MemoryEnhancementQueue, RedisEnhancementQueue};
pub use store::{MemoryResumeStore, PgResumeStore, ResumeStore};
