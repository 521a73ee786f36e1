//! Linkd people search.

mod config;
mod tool;
mod types;

pub use config::{DEFAULT_LINKD_API_URL, LinkdConfig};
pub use tool::{DEFAULT_SEARCH_LIMIT, SEARCH_USERS, SearchUsersTool};
pub use types::{LinkdUser, SearchUsersInput};
