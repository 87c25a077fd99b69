pub mod gate;
pub mod profile;
pub mod query;
pub mod similarity;
pub mod taxonomy;
pub mod text;

pub use gate::{RejectCode, index_gate};
pub use profile::{Academician, EntityType, Postgraduate, Profile, Program, Undergraduate};
pub use query::{QueryClass, classify_query, enhance_query};
pub use taxonomy::TaxonomyResolver;
