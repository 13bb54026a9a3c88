pub mod cache;
pub mod loaders;
pub mod stats;
pub mod transform;

pub use cache::{CacheStats, CachedLoader, DEFAULT_CACHE_CAPACITY};
pub use loaders::{CsvLayout, CsvPopulationLoader};
pub use transform::PopulationTransformer;
