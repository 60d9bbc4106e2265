pub mod clock;
pub mod session;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use session::{Session, TokenStatus};
pub use token::{AuthEndpoints, Credential, TokenManager, TokenState, DEFAULT_AUTH_BASE_URL};
