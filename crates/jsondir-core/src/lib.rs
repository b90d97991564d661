pub mod errors;
pub mod model;
pub mod parse;
pub mod query;
pub mod util;
pub mod value;

pub use errors::*;
pub use model::*;
pub use parse::*;
pub use query::*;
pub use value::*;
