mod atomic;
mod interface;
mod lock;
mod multi;
mod policy;

pub use atomic::*;
pub use interface::*;
pub use lock::*;
pub use multi::*;
pub use policy::*;
