use blog_types::{NewUser, User};
use rusqlite::params;
use tracing::debug;

use crate::{Database, Result, StoreError};

impl Database {
    /// Insert a user. Unset role and permission resolve to the seeded `user` rows.
    pub fn create_user(&self, user: &NewUser) -> Result<()> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO user (id, username, email, password, role_id, permission_id, photo_id)
                 VALUES (?1, ?2, ?3, ?4,
                         COALESCE(?5, (SELECT id FROM role WHERE name_code = 'user')),
                         COALESCE(?6, (SELECT id FROM permission WHERE name_code = 'user')),
                         ?7)",
                params![
                    user.id,
                    user.username,
                    user.email,
                    user.password,
                    user.role_id,
                    user.permission_id,
                    user.photo_id
                ],
            )?;
            if inserted == 0 {
                return Err(StoreError::NotInserted);
            }
            Ok(())
        })?;

        debug!(user_id = %user.id, "User created");
        Ok(())
    }

    pub fn get_user(&self, id: &str) -> Result<User> {
        self.with_conn(|conn| {
            let user = conn
                .prepare_cached(
                    "SELECT id, username, email, password, role_id, permission_id, photo_id
                     FROM user WHERE id = ?1",
                )?
                .query_row([id], |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        email: row.get(2)?,
                        password: row.get(3)?,
                        role_id: row.get::<_, Option<i64>>(4)?.unwrap_or_default(),
                        permission_id: row.get::<_, Option<i64>>(5)?.unwrap_or_default(),
                        photo_id: row.get(6)?,
                    })
                })?;
            Ok(user)
        })
    }

    /// Removes the user and, by cascade, their posts, comments and reactions.
    pub fn delete_user(&self, id: &str) -> Result<()> {
        let affected = self.with_conn_mut(|conn| {
            Ok(conn.execute("DELETE FROM user WHERE id = ?1", [id])?)
        })?;
        debug!(user_id = id, affected, "User deleted");
        Ok(())
    }
}
