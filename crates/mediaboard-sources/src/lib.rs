pub mod traits;
pub mod error;
pub mod memory;
pub mod supabase;
pub mod tmdb;

pub use traits::{CatalogStore, MetadataProvider, ShowUpdate};
pub use error::SourceError;
pub use memory::MemoryCatalog;
pub use supabase::SupabaseCatalog;
pub use tmdb::TmdbClient;
