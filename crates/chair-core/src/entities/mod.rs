//! Entity structs for the records the session bootstrap touches.
//!
//! Each entity maps to a table in the persistence service (see `chair-db`
//! migrations). All structs derive `Serialize`, `Deserialize`, and `JsonSchema`
//! for JSON roundtrip and schema validation.

mod chapter;
mod membership;
mod profile;
mod role;

pub use chapter::{Chapter, ChapterKey};
pub use membership::{MembershipDetails, MembershipLink};
pub use profile::Profile;
pub use role::{Role, ROLE_MEMBER, ROLE_SOCIAL_CHAIR};
