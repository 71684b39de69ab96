pub mod memory;
pub mod mongo;
pub mod repository;

pub use memory::MemoryRepository;
pub use mongo::MongoRepository;
pub use repository::{EstablishmentRepository, Record, StorageError};
