use serde::Serialize;

/// One row of the `items` table, serialized as `{"id","name","price"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct Item {
    pub id: i32,
    pub name: String,
    pub price: i32,
}
