//! SeaORM entity definitions for the usersearch cache schema.

pub mod cached_user;
pub mod prelude;
