use super::Post;
use crate::error::{SchemaError, SchemaResult};
use crate::schema::medias;
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::{Sqlite, SqliteConnection};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tracing::info;

/// Closed set of attachment variants, stored as lowercase text.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    AsExpression,
    FromSqlRow,
)]
#[strum(serialize_all = "lowercase")]
#[diesel(sql_type = Text)]
pub enum MediaType {
    Reel,
    Post,
    Story,
}

impl MediaType {
    pub fn parse(value: &str) -> SchemaResult<MediaType> {
        MediaType::from_str(value).map_err(|_| {
            SchemaError::validation(format!(
                "media type {value:?} is not one of reel, post, story"
            ))
        })
    }
}

impl ToSql<Text, Sqlite> for MediaType {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        <str as ToSql<Text, Sqlite>>::to_sql(self.as_ref(), out)
    }
}

impl FromSql<Text, Sqlite> for MediaType {
    fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let value = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        MediaType::from_str(&value).map_err(|_| format!("unknown media type {value:?}").into())
    }
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = medias)]
#[diesel(primary_key(media_id))]
pub struct Media {
    pub media_id: i32,
    #[diesel(column_name = type_)]
    pub media_type: MediaType,
    pub url: String,
    pub post_id: i32,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = medias)]
struct NewMedia<'a> {
    #[diesel(column_name = type_)]
    media_type: MediaType,
    url: &'a str,
    post_id: i32,
}

impl Media {
    /// Attaching media counts as an edit of the owning post.
    pub fn create(
        conn: &mut SqliteConnection,
        post_id: i32,
        media_type: MediaType,
        url: &str,
    ) -> SchemaResult<Media> {
        if url.trim().is_empty() {
            return Err(SchemaError::validation("media url must not be empty"));
        }

        conn.transaction(|conn| {
            if !Post::exists(conn, post_id)? {
                return Err(SchemaError::ReferentialIntegrity(format!(
                    "media references missing post {post_id}"
                )));
            }

            let media = diesel::insert_into(medias::table)
                .values(&NewMedia {
                    media_type,
                    url,
                    post_id,
                })
                .returning(Media::as_returning())
                .get_result(conn)?;
            Post::touch(conn, post_id)?;
            info!(media_id = media.media_id, post_id, %media_type, "media attached");
            Ok(media)
        })
    }

    pub fn read(conn: &mut SqliteConnection, media_id: i32) -> SchemaResult<Media> {
        medias::table
            .find(media_id)
            .select(Media::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| SchemaError::not_found("media", media_id))
    }

    pub fn list_for_post(conn: &mut SqliteConnection, post_id: i32) -> SchemaResult<Vec<Media>> {
        Ok(medias::table
            .filter(medias::post_id.eq(post_id))
            .order(medias::media_id.asc())
            .select(Media::as_select())
            .load(conn)?)
    }

    pub fn delete(conn: &mut SqliteConnection, media_id: i32) -> SchemaResult<()> {
        let deleted = diesel::delete(medias::table.find(media_id)).execute(conn)?;
        if deleted == 0 {
            return Err(SchemaError::not_found("media", media_id));
        }
        Ok(())
    }
}
