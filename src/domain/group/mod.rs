//! Group domain module.
//!
//! Groups sell a fixed number of seats; a group activates when the last seat
//! is sold.
//!
//! # Module Structure
//!
//! - `aggregate` - Group aggregate and seat accounting
//! - `status` - GroupStatus state machine
//! - `membership` - GroupMembership rows and roles

mod aggregate;
mod membership;
mod status;

pub use aggregate::Group;
pub use membership::{GroupMembership, MemberRole, MemberStatus};
pub use status::GroupStatus;
