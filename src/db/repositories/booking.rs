use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::db::now_utc;
use crate::entities::bookings;

/// Input for creating or updating a booking.
#[derive(Debug, Clone)]
pub struct BookingInput {
    pub full_name: String,
    pub email: String,
    pub service: String,
    pub booking_date: String,
    pub booking_time: String,
    pub notes: String,
    pub status: String,
}

pub struct BookingRepository {
    conn: DatabaseConnection,
}

impl BookingRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, user_id: i32, input: BookingInput) -> Result<bookings::Model> {
        let now = now_utc();

        bookings::ActiveModel {
            user_id: Set(user_id),
            full_name: Set(input.full_name),
            email: Set(input.email),
            service: Set(input.service),
            booking_date: Set(input.booking_date),
            booking_time: Set(input.booking_time),
            notes: Set(input.notes),
            status: Set(input.status),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert booking")
    }

    pub async fn get(&self, id: i32) -> Result<Option<bookings::Model>> {
        bookings::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query booking")
    }

    pub async fn list_all(&self) -> Result<Vec<bookings::Model>> {
        bookings::Entity::find()
            .order_by_desc(bookings::Column::CreatedAt)
            .order_by_desc(bookings::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list bookings")
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<bookings::Model>> {
        bookings::Entity::find()
            .filter(bookings::Column::UserId.eq(user_id))
            .order_by_desc(bookings::Column::CreatedAt)
            .order_by_desc(bookings::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list bookings for user")
    }

    pub async fn update(&self, booking: bookings::Model, input: BookingInput) -> Result<bookings::Model> {
        let mut active: bookings::ActiveModel = booking.into();
        active.full_name = Set(input.full_name);
        active.email = Set(input.email);
        active.service = Set(input.service);
        active.booking_date = Set(input.booking_date);
        active.booking_time = Set(input.booking_time);
        active.notes = Set(input.notes);
        active.status = Set(input.status);
        active.updated_at = Set(now_utc());

        active.update(&self.conn).await.context("Failed to update booking")
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = bookings::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete booking")?;

        Ok(result.rows_affected > 0)
    }
}
