mod logs;

pub use logs::{
    dim, log_db_error, log_db_ready, log_db_status, log_followed, log_migrations_applied,
    log_projection, log_startup_config, log_table_counts, log_unfollowed, pad_label,
};
