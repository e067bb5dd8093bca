//! Carts Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::domain::{
    UserUuid,
    carts::models::{Cart, CartOwner, CartUuid, SessionKey},
};

const GET_CART_SQL: &str = include_str!("../sql/get_cart.sql");
const GET_CART_BY_OWNER_SQL: &str = include_str!("../sql/get_cart_by_owner.sql");
const CREATE_CART_SQL: &str = include_str!("../sql/create_cart.sql");
const DELETE_CART_SQL: &str = include_str!("../sql/delete_cart.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartsRepository;

impl PgCartsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<Cart, sqlx::Error> {
        query_as::<Postgres, Cart>(GET_CART_SQL)
            .bind(cart.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_cart_by_owner(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: &CartOwner,
    ) -> Result<Option<Cart>, sqlx::Error> {
        let (user_uuid, session_key) = owner_columns(owner);

        query_as::<Postgres, Cart>(GET_CART_BY_OWNER_SQL)
            .bind(user_uuid)
            .bind(session_key)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn create_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        owner: &CartOwner,
    ) -> Result<Cart, sqlx::Error> {
        let (user_uuid, session_key) = owner_columns(owner);

        query_as::<Postgres, Cart>(CREATE_CART_SQL)
            .bind(cart.into_uuid())
            .bind(user_uuid)
            .bind(session_key)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CART_SQL)
            .bind(cart.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn owner_columns(owner: &CartOwner) -> (Option<Uuid>, Option<&str>) {
    match owner {
        CartOwner::User(user) => (Some(user.into_uuid()), None),
        CartOwner::Session(key) => (None, Some(key.as_str())),
    }
}

impl<'r> FromRow<'r, PgRow> for Cart {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let user_uuid: Option<Uuid> = row.try_get("user_uuid")?;
        let session_key: Option<String> = row.try_get("session_key")?;

        // The schema check constraint guarantees exactly one owner column.
        let owner = match (user_uuid, session_key) {
            (Some(user), None) => CartOwner::User(UserUuid::from_uuid(user)),
            (None, Some(key)) => {
                CartOwner::Session(SessionKey::new(key).map_err(|e| sqlx::Error::ColumnDecode {
                    index: "session_key".to_string(),
                    source: Box::new(e),
                })?)
            }
            _ => {
                return Err(sqlx::Error::ColumnDecode {
                    index: "user_uuid".to_string(),
                    source: "cart must have exactly one owner".into(),
                });
            }
        };

        Ok(Self {
            uuid: CartUuid::from_uuid(row.try_get("uuid")?),
            owner,
            lines: Vec::new(),
            total: 0,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
