pub mod conversion;
pub mod definition;
pub mod value;

pub use conversion::*;
pub use definition::*;
pub use value::*;
