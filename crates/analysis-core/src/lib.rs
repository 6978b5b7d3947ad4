pub mod error;
pub mod frame;
pub mod market;
pub mod traits;
pub mod types;

pub use error::*;
pub use frame::*;
pub use market::*;
pub use traits::*;
pub use types::*;
