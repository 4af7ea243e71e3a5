pub mod error;
pub mod facts;
pub mod numeric;
pub mod table;
pub mod traits;
pub mod types;

pub use error::*;
pub use facts::*;
pub use table::*;
pub use traits::*;
pub use types::*;
