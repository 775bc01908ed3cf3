//! The authenticated user record and its engine `Actor` mapping.

use engine::{Actor, Role};
use sea_orm::entity::prelude::*;

use crate::ServerError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub role: String,
    pub token: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Derives the engine actor from the authenticated user row.
pub fn actor(user: &Model) -> Result<Actor, ServerError> {
    let role = Role::try_from(user.role.as_str())?;
    Ok(Actor::new(user.id.clone(), role))
}
