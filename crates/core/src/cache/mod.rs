mod error;
mod keys;
mod patterns;
mod repository;
mod serialization;
mod traits;

pub use error::{CacheError, Result};
pub use keys::{all_keys_pattern, count_key, format_key, list_query_key};
pub use patterns::pattern_matches;
pub use repository::CacheRepository;
pub use serialization::{deserialize, serialize, SerializationError};
pub use traits::Cache;
