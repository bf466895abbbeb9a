mod certificate;
mod identity;
mod timeout;

pub use certificate::*;
pub use identity::*;
pub use timeout::*;
