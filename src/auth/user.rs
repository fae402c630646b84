//! Users of the application and the store that persists them with their credentials.

use std::{
    fmt::Display,
    str::FromStr,
    sync::{Arc, Mutex},
};

use email_address::EmailAddress;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error, PasswordHash, ValidatedPassword,
    db::{lock_connection, timestamp_now},
};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// The password hash and session tokens are never serialized, so a `User`
/// can be sent to the client as is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's display name.
    pub name: String,
    /// The user's lowercase email address, unique across all users.
    pub email: EmailAddress,
    /// The user's password hash.
    #[serde(skip)]
    pub password_hash: PasswordHash,
    /// Whether the user is an administrator.
    pub admin: bool,
    /// The session tokens that are currently valid for this user, oldest first.
    #[serde(skip)]
    pub tokens: Vec<String>,
    /// When the user registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    /// When the user record was last saved.
    #[serde(with = "time::serde::rfc3339")]
    pub updated: OffsetDateTime,
    #[serde(skip)]
    new_password: Option<ValidatedPassword>,
}

impl User {
    /// Create a user with no active sessions that was last updated when it was `created`.
    ///
    /// The caller should ensure that `id` is unique.
    pub(crate) fn new(
        id: UserID,
        name: String,
        email: EmailAddress,
        password_hash: PasswordHash,
        created: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            name,
            email,
            password_hash,
            admin: false,
            tokens: Vec::new(),
            created,
            updated: created,
            new_password: None,
        }
    }

    /// Stage a new password for the user.
    ///
    /// The password is hashed, and replaces [User::password_hash], the next
    /// time the user is passed to [CredentialStore::save].
    pub fn set_password(&mut self, password: ValidatedPassword) {
        self.new_password = Some(password);
    }

    /// Whether a new password is waiting to be hashed and saved.
    #[cfg(test)]
    pub(crate) fn has_pending_password(&self) -> bool {
        self.new_password.is_some()
    }
}

/// The details needed to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// The user's display name.
    pub name: String,
    /// The user's email address, any letter case.
    pub email: String,
    /// The plaintext password.
    pub password: String,
}

/// Trim `raw_name` and check that there is something left.
///
/// # Errors
/// Returns [Error::EmptyName] if the name is empty or only whitespace.
pub fn validate_name(raw_name: &str) -> Result<String, Error> {
    let name = raw_name.trim();

    if name.is_empty() {
        Err(Error::EmptyName)
    } else {
        Ok(name.to_owned())
    }
}

/// Parse an email address, normalising it to lowercase.
///
/// # Errors
/// Returns [Error::InvalidEmail] if `raw_email` is not a valid email address.
pub fn parse_email(raw_email: &str) -> Result<EmailAddress, Error> {
    let normalised = raw_email.trim().to_lowercase();

    EmailAddress::from_str(&normalised).map_err(|_| Error::InvalidEmail(raw_email.to_owned()))
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL,
                admin INTEGER NOT NULL DEFAULT 0,
                created TEXT NOT NULL,
                updated TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create the table that records each user's active session tokens.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_token_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user_token (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                token TEXT UNIQUE NOT NULL,
                created TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_user_token_user_id ON user_token(user_id)",
        (),
    )?;

    Ok(())
}

/// Handles the creation, retrieval and updating of [User]s and their session tokens.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    connection: Arc<Mutex<Connection>>,
    password_cost: u32,
    /// Verified against when the email is unknown so that a failed log in
    /// takes as long whether or not the email exists.
    dummy_hash: PasswordHash,
}

impl CredentialStore {
    /// Create a new credential store that hashes passwords with the bcrypt `password_cost`.
    ///
    /// # Errors
    /// Returns [Error::HashingError] if `password_cost` is not a valid bcrypt cost.
    pub fn new(connection: Arc<Mutex<Connection>>, password_cost: u32) -> Result<Self, Error> {
        let dummy_hash = PasswordHash::new(
            ValidatedPassword::new("not a real password")?,
            password_cost,
        )?;

        Ok(Self {
            connection,
            password_cost,
            dummy_hash,
        })
    }

    /// Validate, hash and insert a new user.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [Error::EmptyName] if the name is empty,
    /// - [Error::InvalidEmail] if the email is not a valid email address,
    /// - [Error::PasswordTooShort] if the password is too short,
    /// - [Error::DuplicateEmail] if the email already belongs to a user,
    /// - or [Error::SqlError] if there is some other SQL error.
    pub fn create(&self, new_user: NewUser) -> Result<User, Error> {
        let name = validate_name(&new_user.name)?;
        let email = parse_email(&new_user.email)?;
        let password = ValidatedPassword::new(&new_user.password)?;
        let password_hash = PasswordHash::new(password, self.password_cost)?;
        let now = timestamp_now();

        let connection = lock_connection(&self.connection)?;
        let id = connection
            .prepare(
                "INSERT INTO user (name, email, password, admin, created, updated)
                 VALUES (?1, ?2, ?3, 0, ?4, ?4)
                 RETURNING id",
            )?
            .query_row(
                (&name, email.to_string(), password_hash.as_str(), now),
                |row| row.get(0),
            )?;

        tracing::info!("Created user {id}");

        Ok(User::new(UserID::new(id), name, email, password_hash, now))
    }

    /// Find the user with `email` whose password is `password`.
    ///
    /// Returns `Ok(None)` if either the email does not belong to a user or
    /// the password is wrong. The two cases cannot be told apart.
    ///
    /// # Errors
    /// Returns an error if the database could not be queried or the stored hash is corrupt.
    pub fn find_by_credentials(&self, email: &str, password: &str) -> Result<Option<User>, Error> {
        let user = match parse_email(email) {
            Ok(email) => self.find_by_email(&email)?,
            Err(_) => None,
        };

        match user {
            Some(user) if user.password_hash.verify(password)? => Ok(Some(user)),
            Some(_) => Ok(None),
            None => {
                self.dummy_hash.verify(password)?;
                Ok(None)
            }
        }
    }

    /// Get the user with the ID `id`.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if there is no such user, or [Error::SqlError] if there are SQL related errors.
    pub fn find_by_id(&self, id: UserID) -> Result<User, Error> {
        let connection = lock_connection(&self.connection)?;

        let mut user = connection
            .prepare(
                "SELECT id, name, email, password, admin, created, updated
                 FROM user WHERE id = :id",
            )?
            .query_row(&[(":id", &id.as_i64())], map_user_row)?;
        user.tokens = select_tokens(user.id, &connection)?;

        Ok(user)
    }

    /// Get the user with the email address `email`, if there is one.
    ///
    /// # Errors
    ///
    /// Returns [Error::SqlError] if there are SQL related errors.
    pub fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, Error> {
        let connection = lock_connection(&self.connection)?;

        let user = connection
            .prepare(
                "SELECT id, name, email, password, admin, created, updated
                 FROM user WHERE email = :email",
            )?
            .query_row(&[(":email", &email.to_string())], map_user_row)
            .optional()?;

        match user {
            Some(mut user) => {
                user.tokens = select_tokens(user.id, &connection)?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Record `token` as an active session for `user`.
    ///
    /// # Errors
    ///
    /// Returns [Error::SqlError] if the token could not be inserted, e.g. the user has been deleted.
    pub fn add_token(&self, user: &mut User, token: &str) -> Result<(), Error> {
        lock_connection(&self.connection)?.execute(
            "INSERT INTO user_token (user_id, token, created) VALUES (?1, ?2, ?3)",
            (user.id.as_i64(), token, timestamp_now()),
        )?;

        user.tokens.push(token.to_owned());

        Ok(())
    }

    /// Revoke the session `token` for `user`.
    ///
    /// Removing a token that is not active is not an error.
    ///
    /// # Errors
    ///
    /// Returns [Error::SqlError] if there are SQL related errors.
    pub fn remove_token(&self, user: &mut User, token: &str) -> Result<(), Error> {
        lock_connection(&self.connection)?.execute(
            "DELETE FROM user_token WHERE user_id = ?1 AND token = ?2",
            (user.id.as_i64(), token),
        )?;

        user.tokens.retain(|active_token| active_token != token);

        Ok(())
    }

    /// Revoke every session token for `user`.
    ///
    /// # Errors
    ///
    /// Returns [Error::SqlError] if there are SQL related errors.
    pub fn clear_tokens(&self, user: &mut User) -> Result<(), Error> {
        let rows_affected = lock_connection(&self.connection)?.execute(
            "DELETE FROM user_token WHERE user_id = ?1",
            [user.id.as_i64()],
        )?;

        tracing::debug!("Revoked {rows_affected} session(s) for user {}", user.id);
        user.tokens.clear();

        Ok(())
    }

    /// Write the user's name, email, admin flag and password back to the database.
    ///
    /// If a new password was staged with [User::set_password], it is hashed
    /// here and replaces the stored hash. Otherwise the stored hash is written
    /// back unchanged. `updated` is set to the current time.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [Error::EmptyName] if the name has been set to an empty string,
    /// - [Error::DuplicateEmail] if the email now belongs to another user,
    /// - [Error::NotFound] if the user is not in the database,
    /// - or [Error::SqlError] if there is some other SQL error.
    pub fn save(&self, user: &mut User) -> Result<(), Error> {
        user.name = validate_name(&user.name)?;

        if let Some(password) = user.new_password.take() {
            user.password_hash = PasswordHash::new(password, self.password_cost)?;
        }

        let updated = timestamp_now();
        let rows_affected = lock_connection(&self.connection)?.execute(
            "UPDATE user SET name = ?1, email = ?2, password = ?3, admin = ?4, updated = ?5
             WHERE id = ?6",
            (
                &user.name,
                user.email.to_string(),
                user.password_hash.as_str(),
                user.admin,
                updated,
                user.id.as_i64(),
            ),
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        user.updated = updated;

        Ok(())
    }
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let name = row.get(1)?;
    let raw_email: String = row.get(2)?;
    let raw_password_hash: String = row.get(3)?;
    let admin = row.get(4)?;
    let created = row.get(5)?;
    let updated = row.get(6)?;

    let mut user = User::new(
        UserID::new(raw_id),
        name,
        EmailAddress::new_unchecked(raw_email),
        PasswordHash::new_unchecked(&raw_password_hash),
        created,
    );
    user.admin = admin;
    user.updated = updated;

    Ok(user)
}

fn select_tokens(user_id: UserID, connection: &Connection) -> Result<Vec<String>, Error> {
    connection
        .prepare("SELECT token FROM user_token WHERE user_id = :user_id ORDER BY id")?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| row.get(0))?
        .collect::<Result<Vec<String>, rusqlite::Error>>()
        .map_err(|error| error.into())
}
