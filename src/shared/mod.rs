pub mod errors;
pub mod locks;
pub mod money;
pub mod shutdown;
pub mod time;

pub use errors::*;
pub use locks::*;
pub use money::*;
pub use time::*;
