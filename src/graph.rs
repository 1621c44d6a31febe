//! Directed follow edges between users.
//!
//! The `followers` table is the only place an edge lives. "Following" and "followers" are
//! queries over it and hand back plain values, so there is no second path to write through.

use crate::db::now_millis;
use crate::error::{SchemaError, SchemaResult};
use crate::schema::{followers, users};
use crate::users::User;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{debug, info};

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = followers)]
#[diesel(primary_key(follower_id))]
pub struct Follower {
    pub follower_id: i32,
    /// The user doing the following.
    pub user_from_id: i32,
    /// The user being followed.
    pub user_to_id: i32,
    pub followed_at: i64,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = followers)]
struct NewFollower {
    user_from_id: i32,
    user_to_id: i32,
    followed_at: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowCounts {
    pub following: i64,
    pub followers: i64,
}

impl Follower {
    pub fn follow(conn: &mut SqliteConnection, from_id: i32, to_id: i32) -> SchemaResult<Follower> {
        if from_id == to_id {
            return Err(SchemaError::Conflict(format!("user {from_id} cannot follow themselves")));
        }

        conn.transaction(|conn| {
            for id in [from_id, to_id] {
                if !User::exists(conn, id)? {
                    return Err(SchemaError::ReferentialIntegrity(format!(
                        "follow edge references missing user {id}"
                    )));
                }
            }

            if Self::is_following(conn, from_id, to_id)? {
                return Err(SchemaError::Uniqueness(format!(
                    "user {from_id} already follows user {to_id}"
                )));
            }

            let edge = diesel::insert_into(followers::table)
                .values(&NewFollower {
                    user_from_id: from_id,
                    user_to_id: to_id,
                    followed_at: now_millis(),
                })
                .returning(Follower::as_returning())
                .get_result(conn)?;
            info!(from_id, to_id, "follow edge created");
            Ok(edge)
        })
    }

    pub fn unfollow(conn: &mut SqliteConnection, from_id: i32, to_id: i32) -> SchemaResult<()> {
        let deleted = diesel::delete(
            followers::table
                .filter(followers::user_from_id.eq(from_id))
                .filter(followers::user_to_id.eq(to_id)),
        )
        .execute(conn)?;

        if deleted == 0 {
            return Err(SchemaError::NotFound(format!(
                "user {from_id} does not follow user {to_id}"
            )));
        }
        info!(from_id, to_id, "follow edge removed");
        Ok(())
    }

    pub fn is_following(conn: &mut SqliteConnection, from_id: i32, to_id: i32) -> SchemaResult<bool> {
        let count: i64 = followers::table
            .filter(followers::user_from_id.eq(from_id))
            .filter(followers::user_to_id.eq(to_id))
            .count()
            .get_result(conn)?;
        Ok(count > 0)
    }

    /// Ids of the users `user_id` follows, ascending.
    pub fn list_following(conn: &mut SqliteConnection, user_id: i32) -> SchemaResult<Vec<i32>> {
        let ids = followers::table
            .filter(followers::user_from_id.eq(user_id))
            .order(followers::user_to_id.asc())
            .select(followers::user_to_id)
            .load(conn)?;
        debug!(user_id, count = ids.len(), "listed following");
        Ok(ids)
    }

    /// Ids of the users following `user_id`, ascending.
    pub fn list_followers(conn: &mut SqliteConnection, user_id: i32) -> SchemaResult<Vec<i32>> {
        let ids = followers::table
            .filter(followers::user_to_id.eq(user_id))
            .order(followers::user_from_id.asc())
            .select(followers::user_from_id)
            .load(conn)?;
        debug!(user_id, count = ids.len(), "listed followers");
        Ok(ids)
    }

    pub fn following_users(conn: &mut SqliteConnection, user_id: i32) -> SchemaResult<Vec<User>> {
        Ok(followers::table
            .inner_join(users::table.on(users::user_id.eq(followers::user_to_id)))
            .filter(followers::user_from_id.eq(user_id))
            .order(users::user_id.asc())
            .select(User::as_select())
            .load(conn)?)
    }

    pub fn follower_users(conn: &mut SqliteConnection, user_id: i32) -> SchemaResult<Vec<User>> {
        Ok(followers::table
            .inner_join(users::table.on(users::user_id.eq(followers::user_from_id)))
            .filter(followers::user_to_id.eq(user_id))
            .order(users::user_id.asc())
            .select(User::as_select())
            .load(conn)?)
    }

    pub fn follow_counts(conn: &mut SqliteConnection, user_id: i32) -> SchemaResult<FollowCounts> {
        Ok(FollowCounts {
            following: followers::table
                .filter(followers::user_from_id.eq(user_id))
                .count()
                .get_result(conn)?,
            followers: followers::table
                .filter(followers::user_to_id.eq(user_id))
                .count()
                .get_result(conn)?,
        })
    }
}
