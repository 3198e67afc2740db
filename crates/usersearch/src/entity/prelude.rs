//! Common re-exports for convenient entity usage.

pub use super::cached_user::{
    ActiveModel as CachedUserActiveModel, Column as CachedUserColumn, Entity as CachedUser,
    Model as CachedUserModel,
};
