use crate::content::Post;
use crate::error::{SchemaError, SchemaResult};
use crate::schema::{comments, followers, posts, users};
use crate::settings::DeletePolicy;
use crate::validation::{
    check_email, check_length, require_text, PASSWORD_MAX, PERSON_NAME_MAX, USER_NAME_MAX,
};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::info;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = users)]
#[diesel(primary_key(user_id))]
pub struct User {
    pub user_id: i32,
    pub user_name: String,
    pub password: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = users)]
pub struct UserForm {
    pub user_name: String,
    pub password: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserForm {
    pub fn new(user_name: &str, password: &str, email: &str) -> Self {
        Self {
            user_name: user_name.to_string(),
            password: password.to_string(),
            email: email.to_string(),
            first_name: None,
            last_name: None,
        }
    }

    fn validate(&self) -> SchemaResult<()> {
        require_text("user_name", &self.user_name, USER_NAME_MAX)?;
        require_text("password", &self.password, PASSWORD_MAX)?;
        check_email(&self.email)?;
        if let Some(first) = &self.first_name {
            check_length("first_name", first, PERSON_NAME_MAX)?;
        }
        if let Some(last) = &self.last_name {
            check_length("last_name", last, PERSON_NAME_MAX)?;
        }
        Ok(())
    }
}

/// Profile edit. `None` leaves a column alone; `Some(None)` clears an optional name.
#[derive(AsChangeset, Debug, Clone, Default)]
#[diesel(table_name = users)]
pub struct UserUpdateForm {
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<Option<String>>,
    pub last_name: Option<Option<String>>,
}

impl UserUpdateForm {
    fn is_empty(&self) -> bool {
        self.user_name.is_none()
            && self.password.is_none()
            && self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
    }

    fn validate(&self) -> SchemaResult<()> {
        if let Some(name) = &self.user_name {
            require_text("user_name", name, USER_NAME_MAX)?;
        }
        if let Some(password) = &self.password {
            require_text("password", password, PASSWORD_MAX)?;
        }
        if let Some(email) = &self.email {
            check_email(email)?;
        }
        if let Some(Some(first)) = &self.first_name {
            check_length("first_name", first, PERSON_NAME_MAX)?;
        }
        if let Some(Some(last)) = &self.last_name {
            check_length("last_name", last, PERSON_NAME_MAX)?;
        }
        Ok(())
    }
}

/// Rows in other tables that still point at a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserDependents {
    pub posts: i64,
    pub comments: i64,
    pub follow_edges: i64,
}

impl UserDependents {
    pub fn is_empty(&self) -> bool {
        self.posts == 0 && self.comments == 0 && self.follow_edges == 0
    }
}

impl User {
    pub fn create(conn: &mut SqliteConnection, form: &UserForm) -> SchemaResult<User> {
        form.validate()?;
        let user = diesel::insert_into(users::table)
            .values(form)
            .returning(User::as_returning())
            .get_result(conn)?;
        info!(user_id = user.user_id, user_name = %user.user_name, "user created");
        Ok(user)
    }

    pub fn read(conn: &mut SqliteConnection, user_id: i32) -> SchemaResult<User> {
        users::table
            .find(user_id)
            .select(User::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| SchemaError::not_found("user", user_id))
    }

    pub fn read_by_name(conn: &mut SqliteConnection, name: &str) -> SchemaResult<Option<User>> {
        Ok(users::table
            .filter(users::user_name.eq(name))
            .select(User::as_select())
            .first(conn)
            .optional()?)
    }

    pub fn read_by_email(conn: &mut SqliteConnection, email: &str) -> SchemaResult<Option<User>> {
        Ok(users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .first(conn)
            .optional()?)
    }

    pub fn list(conn: &mut SqliteConnection) -> SchemaResult<Vec<User>> {
        Ok(users::table
            .order(users::user_id.asc())
            .select(User::as_select())
            .load(conn)?)
    }

    pub fn exists(conn: &mut SqliteConnection, user_id: i32) -> SchemaResult<bool> {
        let count: i64 = users::table.find(user_id).count().get_result(conn)?;
        Ok(count > 0)
    }

    pub fn update(
        conn: &mut SqliteConnection,
        user_id: i32,
        form: &UserUpdateForm,
    ) -> SchemaResult<User> {
        if form.is_empty() {
            return Self::read(conn, user_id);
        }
        form.validate()?;
        diesel::update(users::table.find(user_id))
            .set(form)
            .returning(User::as_returning())
            .get_result(conn)
            .optional()?
            .ok_or_else(|| SchemaError::not_found("user", user_id))
    }

    pub fn dependents(conn: &mut SqliteConnection, user_id: i32) -> SchemaResult<UserDependents> {
        Ok(UserDependents {
            posts: posts::table
                .filter(posts::user_id.eq(user_id))
                .count()
                .get_result(conn)?,
            comments: comments::table
                .filter(comments::author_id.eq(user_id))
                .count()
                .get_result(conn)?,
            follow_edges: followers::table
                .filter(
                    followers::user_from_id
                        .eq(user_id)
                        .or(followers::user_to_id.eq(user_id)),
                )
                .count()
                .get_result(conn)?,
        })
    }

    /// Deletes a user. Under `Restrict` any post, comment or follow edge touching the user
    /// blocks the delete. Under `Cascade` the user's own edges, comments and posts go with
    /// them; edges between other users are left as they are.
    pub fn delete(
        conn: &mut SqliteConnection,
        user_id: i32,
        policy: DeletePolicy,
    ) -> SchemaResult<usize> {
        conn.transaction(|conn| {
            if !Self::exists(conn, user_id)? {
                return Err(SchemaError::not_found("user", user_id));
            }

            let dependents = Self::dependents(conn, user_id)?;
            match policy {
                DeletePolicy::Restrict if !dependents.is_empty() => {
                    return Err(SchemaError::ReferentialIntegrity(format!(
                        "user {user_id} is still referenced by {} post(s), {} comment(s), {} follow edge(s)",
                        dependents.posts, dependents.comments, dependents.follow_edges
                    )));
                }
                DeletePolicy::Restrict => {}
                DeletePolicy::Cascade => {
                    diesel::delete(
                        followers::table.filter(
                            followers::user_from_id
                                .eq(user_id)
                                .or(followers::user_to_id.eq(user_id)),
                        ),
                    )
                    .execute(conn)?;
                    diesel::delete(comments::table.filter(comments::author_id.eq(user_id)))
                        .execute(conn)?;
                    let post_ids: Vec<i32> = posts::table
                        .filter(posts::user_id.eq(user_id))
                        .select(posts::post_id)
                        .load(conn)?;
                    for post_id in post_ids {
                        Post::delete(conn, post_id, DeletePolicy::Cascade)?;
                    }
                }
            }

            let deleted = diesel::delete(users::table.find(user_id)).execute(conn)?;
            info!(user_id, %policy, ?dependents, "user deleted");
            Ok(deleted)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;
    use crate::graph::Follower;

    #[test]
    fn test_crud() {
        let mut conn = establish_test_connection();

        let mut form = UserForm::new("lucas", "secret", "lucas@example.com");
        form.first_name = Some("Lucas".into());
        let inserted = User::create(&mut conn, &form).unwrap();

        let expected = User {
            user_id: inserted.user_id,
            user_name: "lucas".into(),
            password: "secret".into(),
            email: "lucas@example.com".into(),
            first_name: Some("Lucas".into()),
            last_name: None,
        };
        assert_eq!(inserted, expected);
        assert_eq!(User::read(&mut conn, inserted.user_id).unwrap(), expected);

        let update = UserUpdateForm {
            email: Some("lucas@new.example.com".into()),
            first_name: Some(None),
            last_name: Some(Some("Silva".into())),
            ..Default::default()
        };
        let updated = User::update(&mut conn, inserted.user_id, &update).unwrap();
        assert_eq!(updated.email, "lucas@new.example.com");
        assert_eq!(updated.first_name, None);
        assert_eq!(updated.last_name.as_deref(), Some("Silva"));
        assert_eq!(updated.user_name, "lucas");

        let deleted = User::delete(&mut conn, inserted.user_id, DeletePolicy::Restrict).unwrap();
        assert_eq!(deleted, 1);
        assert!(User::read(&mut conn, inserted.user_id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_user_name_and_email_unique() {
        let mut conn = establish_test_connection();
        create_user(&mut conn, "ana");

        let same_name = UserForm::new("ana", "pw", "other@example.com");
        assert!(matches!(
            User::create(&mut conn, &same_name),
            Err(SchemaError::Uniqueness(_))
        ));

        let same_email = UserForm::new("ana2", "pw", "ana@example.com");
        assert!(matches!(
            User::create(&mut conn, &same_email),
            Err(SchemaError::Uniqueness(_))
        ));

        let sophia = create_user(&mut conn, "sophia");
        let steal_email = UserUpdateForm {
            email: Some("ana@example.com".into()),
            ..Default::default()
        };
        assert!(matches!(
            User::update(&mut conn, sophia.user_id, &steal_email),
            Err(SchemaError::Uniqueness(_))
        ));
        assert_eq!(User::list(&mut conn).unwrap().len(), 2);
    }

    #[test]
    fn test_create_rejects_invalid_fields() {
        let mut conn = establish_test_connection();
        let long_password = UserForm::new("ana", &"x".repeat(129), "ana@example.com");
        assert!(matches!(
            User::create(&mut conn, &long_password),
            Err(SchemaError::Validation(_))
        ));
        let bad_email = UserForm::new("ana", "pw", "not-an-email");
        assert!(matches!(
            User::create(&mut conn, &bad_email),
            Err(SchemaError::Validation(_))
        ));
        let empty_name = UserForm::new("", "pw", "ana@example.com");
        assert!(matches!(
            User::create(&mut conn, &empty_name),
            Err(SchemaError::Validation(_))
        ));
    }

    #[test]
    fn test_lookup_by_name_and_email() {
        let mut conn = establish_test_connection();
        let ana = create_user(&mut conn, "ana");
        assert_eq!(User::read_by_name(&mut conn, "ana").unwrap(), Some(ana.clone()));
        assert_eq!(
            User::read_by_email(&mut conn, "ana@example.com").unwrap(),
            Some(ana)
        );
        assert_eq!(User::read_by_name(&mut conn, "nobody").unwrap(), None);
    }

    #[test]
    fn test_empty_update_returns_current_row() {
        let mut conn = establish_test_connection();
        let ana = create_user(&mut conn, "ana");
        let same = User::update(&mut conn, ana.user_id, &UserUpdateForm::default()).unwrap();
        assert_eq!(same, ana);
        assert!(User::update(&mut conn, 999, &UserUpdateForm::default())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_delete_followed_user_restrict_keeps_edge() {
        let mut conn = establish_test_connection();
        let a = create_user(&mut conn, "ana");
        let b = create_user(&mut conn, "lucas");
        Follower::follow(&mut conn, a.user_id, b.user_id).unwrap();

        let result = User::delete(&mut conn, b.user_id, DeletePolicy::Restrict);
        assert!(matches!(result, Err(SchemaError::ReferentialIntegrity(_))));
        assert!(User::exists(&mut conn, b.user_id).unwrap());
        assert_eq!(
            Follower::list_following(&mut conn, a.user_id).unwrap(),
            vec![b.user_id]
        );
    }

    #[test]
    fn test_delete_followed_user_cascade_removes_only_their_edges() {
        let mut conn = establish_test_connection();
        let ana = create_user(&mut conn, "ana");
        let lucas = create_user(&mut conn, "lucas");
        let sophia = create_user(&mut conn, "sophia");
        Follower::follow(&mut conn, ana.user_id, lucas.user_id).unwrap();
        Follower::follow(&mut conn, sophia.user_id, lucas.user_id).unwrap();
        Follower::follow(&mut conn, lucas.user_id, sophia.user_id).unwrap();
        Follower::follow(&mut conn, sophia.user_id, ana.user_id).unwrap();

        User::delete(&mut conn, ana.user_id, DeletePolicy::Cascade).unwrap();

        assert_eq!(
            Follower::list_following(&mut conn, sophia.user_id).unwrap(),
            vec![lucas.user_id]
        );
        assert_eq!(
            Follower::list_followers(&mut conn, lucas.user_id).unwrap(),
            vec![sophia.user_id]
        );
        assert_eq!(
            Follower::list_following(&mut conn, lucas.user_id).unwrap(),
            vec![sophia.user_id]
        );
    }

    #[test]
    fn test_delete_cascade_removes_content() {
        use crate::content::{Comment, Media, MediaType};
        use crate::db::table_counts;

        let mut conn = establish_test_connection();
        let ana = create_user(&mut conn, "ana");
        let lucas = create_user(&mut conn, "lucas");

        let ana_post = Post::create(&mut conn, ana.user_id).unwrap();
        Media::create(&mut conn, ana_post.post_id, MediaType::Story, "https://cdn/a.png").unwrap();
        Comment::create(&mut conn, lucas.user_id, ana_post.post_id, "nice").unwrap();

        let lucas_post = Post::create(&mut conn, lucas.user_id).unwrap();
        Comment::create(&mut conn, ana.user_id, lucas_post.post_id, "hello").unwrap();
        Comment::create(&mut conn, lucas.user_id, lucas_post.post_id, "thanks").unwrap();

        assert!(matches!(
            User::delete(&mut conn, ana.user_id, DeletePolicy::Restrict),
            Err(SchemaError::ReferentialIntegrity(_))
        ));

        User::delete(&mut conn, ana.user_id, DeletePolicy::Cascade).unwrap();

        let counts = table_counts(&mut conn).unwrap();
        assert_eq!(counts.users, 1);
        assert_eq!(counts.posts, 1);
        assert_eq!(counts.medias, 0);
        assert_eq!(counts.comments, 1);
        assert_eq!(
            Comment::list_for_post(&mut conn, lucas_post.post_id).unwrap()[0].comment_text,
            "thanks"
        );
    }

    #[test]
    fn test_delete_missing_user() {
        let mut conn = establish_test_connection();
        assert!(User::delete(&mut conn, 42, DeletePolicy::Cascade)
            .unwrap_err()
            .is_not_found());
    }
}
