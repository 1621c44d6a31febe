use anyhow::{bail, Context, Result};
use diesel::SqliteConnection;
use social_schema::db::{establish_pool, run_migrations};
use social_schema::settings::Integrity;
use social_schema::utils::{
    log_db_error, log_db_status, log_followed, log_projection, log_unfollowed,
};
use social_schema::{settings, Follower, Post, User};
use std::env;
use std::process;

fn print_usage() {
    eprintln!("Usage: follow-graph <command> <args>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  follow <from> <to>     <from> starts following <to>");
    eprintln!("  unfollow <from> <to>   remove the edge <from> -> <to>");
    eprintln!("  following <user>      users <user> follows");
    eprintln!("  followers <user>      users following <user>");
    eprintln!("  delete-user <user>    delete a user under the configured policy");
    eprintln!("  delete-post <id>      delete a post under the configured policy");
    eprintln!();
    eprintln!("Users may be given by numeric id or by user name.");
}

fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        process::exit(1);
    }

    if let Err(e) = run(&args) {
        log_db_error(&format!("{e:#}"));
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    let s = settings();
    let pool = establish_pool(&s.database)?;
    let mut conn = pool.get().context("failed to get connection")?;
    run_migrations(&mut conn)?;

    execute(&mut conn, args, &s.integrity)
}

fn execute(conn: &mut SqliteConnection, args: &[String], integrity: &Integrity) -> Result<()> {
    let Some((command, rest)) = args.split_first() else {
        print_usage();
        bail!("missing command");
    };

    match (command.as_str(), rest) {
        ("follow", [from, to]) => {
            let from = resolve_user(conn, from)?;
            let to = resolve_user(conn, to)?;
            Follower::follow(conn, from.user_id, to.user_id)?;
            log_followed(&from, &to);
        }
        ("unfollow", [from, to]) => {
            let from = resolve_user(conn, from)?;
            let to = resolve_user(conn, to)?;
            Follower::unfollow(conn, from.user_id, to.user_id)?;
            log_unfollowed(&from, &to);
        }
        ("following", [user]) => {
            let user = resolve_user(conn, user)?;
            let users = Follower::following_users(conn, user.user_id)?;
            let counts = Follower::follow_counts(conn, user.user_id)?;
            log_projection("following", &user, &users, counts);
        }
        ("followers", [user]) => {
            let user = resolve_user(conn, user)?;
            let users = Follower::follower_users(conn, user.user_id)?;
            let counts = Follower::follow_counts(conn, user.user_id)?;
            log_projection("followers", &user, &users, counts);
        }
        ("delete-user", [user]) => {
            let user = resolve_user(conn, user)?;
            let policy = integrity.user_delete;
            User::delete(conn, user.user_id, policy)?;
            log_db_status(&format!("deleted user {} ({policy})", user.user_name));
        }
        ("delete-post", [post_id]) => {
            let post_id: i32 = post_id
                .parse()
                .with_context(|| format!("post id {post_id:?} is not a number"))?;
            let policy = integrity.post_delete;
            Post::delete(conn, post_id, policy)?;
            log_db_status(&format!("deleted post {post_id} ({policy})"));
        }
        _ => {
            print_usage();
            bail!("unrecognized arguments: {}", args.join(" "));
        }
    }

    Ok(())
}

/// Numeric keys are tried as ids first, then as user names.
fn resolve_user(conn: &mut SqliteConnection, key: &str) -> Result<User> {
    if let Ok(id) = key.parse::<i32>() {
        match User::read(conn, id) {
            Ok(user) => return Ok(user),
            Err(e) if e.is_not_found() => {
                return User::read_by_name(conn, key)?.ok_or_else(|| e.into());
            }
            Err(e) => return Err(e.into()),
        }
    }
    User::read_by_name(conn, key)?.with_context(|| format!("no user named {key:?}"))
}
