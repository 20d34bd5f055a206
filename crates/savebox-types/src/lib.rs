pub mod api;
pub mod ids;
pub mod object_id;
pub mod role;

pub use ids::{Identifier, id_to_string};
pub use object_id::{ObjectId, ParseObjectIdError};
pub use role::{ParseRoleError, Role};
