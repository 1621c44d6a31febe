use crate::db::now_millis;
use crate::error::{SchemaError, SchemaResult};
use crate::schema::{comments, medias, posts};
use crate::settings::DeletePolicy;
use crate::users::User;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::info;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = posts)]
#[diesel(primary_key(post_id))]
pub struct Post {
    pub post_id: i32,
    pub user_id: i32,
    pub created_at: i64,
    pub update_at: i64,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = posts)]
struct NewPost {
    user_id: i32,
    created_at: i64,
    update_at: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostDependents {
    pub medias: i64,
    pub comments: i64,
}

impl PostDependents {
    pub fn is_empty(&self) -> bool {
        self.medias == 0 && self.comments == 0
    }
}

impl Post {
    /// Both timestamps start at the same instant.
    pub fn create(conn: &mut SqliteConnection, user_id: i32) -> SchemaResult<Post> {
        if !User::exists(conn, user_id)? {
            return Err(SchemaError::ReferentialIntegrity(format!(
                "post owner {user_id} does not exist"
            )));
        }

        let now = now_millis();
        let post = diesel::insert_into(posts::table)
            .values(&NewPost {
                user_id,
                created_at: now,
                update_at: now,
            })
            .returning(Post::as_returning())
            .get_result(conn)?;
        info!(post_id = post.post_id, user_id, "post created");
        Ok(post)
    }

    pub fn read(conn: &mut SqliteConnection, post_id: i32) -> SchemaResult<Post> {
        posts::table
            .find(post_id)
            .select(Post::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| SchemaError::not_found("post", post_id))
    }

    pub fn exists(conn: &mut SqliteConnection, post_id: i32) -> SchemaResult<bool> {
        let count: i64 = posts::table.find(post_id).count().get_result(conn)?;
        Ok(count > 0)
    }

    /// Newest first.
    pub fn list_for_user(conn: &mut SqliteConnection, user_id: i32) -> SchemaResult<Vec<Post>> {
        Ok(posts::table
            .filter(posts::user_id.eq(user_id))
            .order((posts::created_at.desc(), posts::post_id.desc()))
            .select(Post::as_select())
            .load(conn)?)
    }

    /// Always moves `update_at` forward, even within the same millisecond as the last write.
    pub fn touch(conn: &mut SqliteConnection, post_id: i32) -> SchemaResult<Post> {
        conn.transaction(|conn| {
            let current = Self::read(conn, post_id)?;
            Self::touch_at(conn, post_id, now_millis().max(current.update_at + 1))
        })
    }

    /// Moves `update_at` only; `created_at` is never rewritten.
    pub fn touch_at(conn: &mut SqliteConnection, post_id: i32, at: i64) -> SchemaResult<Post> {
        diesel::update(posts::table.find(post_id))
            .set(posts::update_at.eq(at))
            .returning(Post::as_returning())
            .get_result(conn)
            .optional()?
            .ok_or_else(|| SchemaError::not_found("post", post_id))
    }

    pub fn dependents(conn: &mut SqliteConnection, post_id: i32) -> SchemaResult<PostDependents> {
        Ok(PostDependents {
            medias: medias::table
                .filter(medias::post_id.eq(post_id))
                .count()
                .get_result(conn)?,
            comments: comments::table
                .filter(comments::post_id.eq(post_id))
                .count()
                .get_result(conn)?,
        })
    }

    pub fn delete(
        conn: &mut SqliteConnection,
        post_id: i32,
        policy: DeletePolicy,
    ) -> SchemaResult<usize> {
        conn.transaction(|conn| {
            if !Self::exists(conn, post_id)? {
                return Err(SchemaError::not_found("post", post_id));
            }

            let dependents = Self::dependents(conn, post_id)?;
            match policy {
                DeletePolicy::Restrict if !dependents.is_empty() => {
                    return Err(SchemaError::ReferentialIntegrity(format!(
                        "post {post_id} still has {} media and {} comment(s)",
                        dependents.medias, dependents.comments
                    )));
                }
                DeletePolicy::Restrict => {}
                DeletePolicy::Cascade => {
                    diesel::delete(medias::table.filter(medias::post_id.eq(post_id)))
                        .execute(conn)?;
                    diesel::delete(comments::table.filter(comments::post_id.eq(post_id)))
                        .execute(conn)?;
                }
            }

            let deleted = diesel::delete(posts::table.find(post_id)).execute(conn)?;
            info!(post_id, %policy, ?dependents, "post deleted");
            Ok(deleted)
        })
    }
}
