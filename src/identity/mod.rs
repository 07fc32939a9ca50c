//! Session and role state for the signed-in user.
//! Keep the public surface thin and split implementation across sub-modules.

mod role;
mod session;
mod storage;

pub use role::{has_role, Action, Capabilities, Role};
pub use session::{CredentialSnapshot, Session, SessionEvent, SessionStore, SessionToken, SubscriptionId, User};
pub use storage::{FileSlotStorage, MemorySlotStorage, SlotStorage, TOKEN_SLOT, USER_SLOT};
