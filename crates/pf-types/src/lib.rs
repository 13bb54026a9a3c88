pub mod dataset;
pub mod errors;
pub mod evaluation;
pub mod model;
pub mod pipeline;
pub mod retrieval;
pub mod run;
pub mod schema;
pub mod transformation;

pub use dataset::*;
pub use errors::*;
pub use evaluation::*;
pub use model::*;
pub use pipeline::*;
pub use retrieval::*;
pub use run::*;
pub use schema::*;
pub use transformation::*;
