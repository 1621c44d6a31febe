use super::Post;
use crate::error::{SchemaError, SchemaResult};
use crate::schema::comments;
use crate::users::User;
use crate::validation::{require_text, COMMENT_TEXT_MAX};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::info;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = comments)]
#[diesel(primary_key(comment_id))]
pub struct Comment {
    pub comment_id: i32,
    pub comment_text: String,
    pub author_id: i32,
    pub post_id: i32,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = comments)]
struct NewComment<'a> {
    comment_text: &'a str,
    author_id: i32,
    post_id: i32,
}

impl Comment {
    /// The author need not own the post.
    pub fn create(
        conn: &mut SqliteConnection,
        author_id: i32,
        post_id: i32,
        text: &str,
    ) -> SchemaResult<Comment> {
        require_text("comment_text", text, COMMENT_TEXT_MAX)?;

        conn.transaction(|conn| {
            if !User::exists(conn, author_id)? {
                return Err(SchemaError::ReferentialIntegrity(format!(
                    "comment author {author_id} does not exist"
                )));
            }
            if !Post::exists(conn, post_id)? {
                return Err(SchemaError::ReferentialIntegrity(format!(
                    "comment references missing post {post_id}"
                )));
            }

            let comment = diesel::insert_into(comments::table)
                .values(&NewComment {
                    comment_text: text,
                    author_id,
                    post_id,
                })
                .returning(Comment::as_returning())
                .get_result(conn)?;
            info!(comment_id = comment.comment_id, author_id, post_id, "comment created");
            Ok(comment)
        })
    }

    pub fn read(conn: &mut SqliteConnection, comment_id: i32) -> SchemaResult<Comment> {
        comments::table
            .find(comment_id)
            .select(Comment::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| SchemaError::not_found("comment", comment_id))
    }

    pub fn list_for_post(conn: &mut SqliteConnection, post_id: i32) -> SchemaResult<Vec<Comment>> {
        Ok(comments::table
            .filter(comments::post_id.eq(post_id))
            .order(comments::comment_id.asc())
            .select(Comment::as_select())
            .load(conn)?)
    }

    pub fn list_for_author(
        conn: &mut SqliteConnection,
        author_id: i32,
    ) -> SchemaResult<Vec<Comment>> {
        Ok(comments::table
            .filter(comments::author_id.eq(author_id))
            .order(comments::comment_id.asc())
            .select(Comment::as_select())
            .load(conn)?)
    }

    pub fn update_text(
        conn: &mut SqliteConnection,
        comment_id: i32,
        text: &str,
    ) -> SchemaResult<Comment> {
        require_text("comment_text", text, COMMENT_TEXT_MAX)?;
        diesel::update(comments::table.find(comment_id))
            .set(comments::comment_text.eq(text))
            .returning(Comment::as_returning())
            .get_result(conn)
            .optional()?
            .ok_or_else(|| SchemaError::not_found("comment", comment_id))
    }

    pub fn delete(conn: &mut SqliteConnection, comment_id: i32) -> SchemaResult<()> {
        let deleted = diesel::delete(comments::table.find(comment_id)).execute(conn)?;
        if deleted == 0 {
            return Err(SchemaError::not_found("comment", comment_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;

    #[test]
    fn test_comment_on_someone_elses_post() {
        let mut conn = establish_test_connection();
        let ana = create_user(&mut conn, "ana");
        let lucas = create_user(&mut conn, "lucas");
        let post = Post::create(&mut conn, ana.user_id).unwrap();

        let comment = Comment::create(&mut conn, lucas.user_id, post.post_id, "great shot").unwrap();
        assert_eq!(comment.author_id, lucas.user_id);
        assert_eq!(comment.post_id, post.post_id);
        assert_eq!(Comment::read(&mut conn, comment.comment_id).unwrap(), comment);
        assert_eq!(Comment::list_for_author(&mut conn, lucas.user_id).unwrap(), vec![comment.clone()]);
        assert_eq!(Comment::list_for_post(&mut conn, post.post_id).unwrap(), vec![comment]);
    }

    #[test]
    fn test_create_requires_author_and_post() {
        let mut conn = establish_test_connection();
        let ana = create_user(&mut conn, "ana");
        let post = Post::create(&mut conn, ana.user_id).unwrap();

        assert!(matches!(
            Comment::create(&mut conn, 999, post.post_id, "hi"),
            Err(SchemaError::ReferentialIntegrity(_))
        ));
        assert!(matches!(
            Comment::create(&mut conn, ana.user_id, 999, "hi"),
            Err(SchemaError::ReferentialIntegrity(_))
        ));
    }

    #[test]
    fn test_text_limits() {
        let mut conn = establish_test_connection();
        let ana = create_user(&mut conn, "ana");
        let post = Post::create(&mut conn, ana.user_id).unwrap();

        assert!(matches!(
            Comment::create(&mut conn, ana.user_id, post.post_id, ""),
            Err(SchemaError::Validation(_))
        ));
        assert!(matches!(
            Comment::create(&mut conn, ana.user_id, post.post_id, &"x".repeat(251)),
            Err(SchemaError::Validation(_))
        ));
        assert!(Comment::create(&mut conn, ana.user_id, post.post_id, &"x".repeat(250)).is_ok());
    }

    #[test]
    fn test_update_and_delete() {
        let mut conn = establish_test_connection();
        let ana = create_user(&mut conn, "ana");
        let post = Post::create(&mut conn, ana.user_id).unwrap();
        let comment = Comment::create(&mut conn, ana.user_id, post.post_id, "typo").unwrap();

        let edited = Comment::update_text(&mut conn, comment.comment_id, "fixed").unwrap();
        assert_eq!(edited.comment_text, "fixed");
        assert!(Comment::update_text(&mut conn, 999, "x").unwrap_err().is_not_found());

        Comment::delete(&mut conn, comment.comment_id).unwrap();
        assert!(Comment::read(&mut conn, comment.comment_id).unwrap_err().is_not_found());
    }
}
