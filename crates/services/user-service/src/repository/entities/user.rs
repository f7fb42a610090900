//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use common::AppError;
use domain::{User, UserRole};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    /// `doctor` or `patient`; written once at signup
    pub role: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_picture: Option<String>,
    pub address_line1: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl TryFrom<Model> for User {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let role: UserRole = model.role.parse().map_err(|_| {
            AppError::internal(format!(
                "user {} has unknown role {:?}",
                model.id, model.role
            ))
        })?;

        Ok(User {
            id: model.id,
            username: model.username,
            email: model.email,
            password_hash: model.password_hash,
            role,
            first_name: model.first_name,
            last_name: model.last_name,
            profile_picture: model.profile_picture,
            address_line1: model.address_line1,
            city: model.city,
            state: model.state,
            pincode: model.pincode,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
