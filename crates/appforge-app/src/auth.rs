//! Mock account service
//!
//! Accounts live in the `users` key with Argon2id password hashes, and the
//! logged-in user (without credentials) in `currentUser`. There is no server:
//! this only gates credits and plan selection locally.
//!
//! Each action is split into a side-effect-free check and a completion step
//! so the login/register flow can show its stages before the session changes.

use std::sync::LazyLock;

use appforge_core::prelude::*;
use appforge_core::{Plan, PublicUser, UserRecord};
use appforge_store::{keys, JsonStoreExt, SharedStore};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use regex::Regex;

use crate::ids::generate_id;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

const INVALID_CREDENTIALS: &str = "Invalid email or password";

// ─────────────────────────────────────────────────────────────────────────────
// Password hashing
// ─────────────────────────────────────────────────────────────────────────────

/// Hash a password with Argon2id and a random salt (PHC string)
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::auth(format!("failed to hash password: {}", e)))
}

/// Check a password against a stored PHC hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| Error::auth(format!("stored hash is unreadable: {}", e)))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(Error::auth(format!("failed to verify password: {}", e))),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Service
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AuthService {
    store: SharedStore,
    starting_credits: u32,
}

impl AuthService {
    pub fn new(store: SharedStore, starting_credits: u32) -> Self {
        Self {
            store,
            starting_credits,
        }
    }

    fn users(&self) -> Vec<UserRecord> {
        self.store.load_or_default(keys::USERS)
    }

    fn find_by_email<'a>(users: &'a [UserRecord], email: &str) -> Option<&'a UserRecord> {
        users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
    }

    /// The logged-in user, if any
    pub fn current_user(&self) -> Option<PublicUser> {
        self.store.load_or_discard(keys::CURRENT_USER)
    }

    /// Validate a registration and build the account without saving it
    pub fn check_registration(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserRecord> {
        let username = username.trim();
        let email = email.trim();

        if username.is_empty() {
            return Err(Error::validation("Username cannot be empty"));
        }
        if !EMAIL_PATTERN.is_match(email) {
            return Err(Error::validation(format!("'{}' is not a valid email", email)));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::validation(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LEN
            )));
        }
        if Self::find_by_email(&self.users(), email).is_some() {
            return Err(Error::validation("An account with this email already exists"));
        }

        Ok(UserRecord {
            id: generate_id("user"),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            plan: Plan::Free,
            credits: self.starting_credits,
        })
    }

    /// Save a checked account and log it in
    pub fn complete_registration(&self, user: UserRecord) -> Result<PublicUser> {
        let mut users = self.users();
        if Self::find_by_email(&users, &user.email).is_some() {
            return Err(Error::validation("An account with this email already exists"));
        }
        let public = user.to_public();
        users.push(user);
        self.store.write_json(keys::USERS, &users)?;
        self.store.write_json(keys::CURRENT_USER, &public)?;
        info!("Registered user {}", public.username);
        Ok(public)
    }

    /// Verify credentials without changing the session
    pub fn check_login(&self, email: &str, password: &str) -> Result<UserRecord> {
        let users = self.users();
        let Some(user) = Self::find_by_email(&users, email.trim()) else {
            return Err(Error::auth(INVALID_CREDENTIALS));
        };
        if !verify_password(password, &user.password_hash)? {
            return Err(Error::auth(INVALID_CREDENTIALS));
        }
        Ok(user.clone())
    }

    /// Start a session for a verified user
    pub fn complete_login(&self, user: &UserRecord) -> Result<PublicUser> {
        let public = user.to_public();
        self.store.write_json(keys::CURRENT_USER, &public)?;
        info!("Logged in as {}", public.username);
        Ok(public)
    }

    pub fn register(&self, username: &str, email: &str, password: &str) -> Result<PublicUser> {
        let user = self.check_registration(username, email, password)?;
        self.complete_registration(user)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<PublicUser> {
        let user = self.check_login(email, password)?;
        self.complete_login(&user)
    }

    pub fn logout(&self) -> Result<()> {
        self.store.remove(keys::CURRENT_USER)?;
        info!("Logged out");
        Ok(())
    }

    /// Deduct credits from the logged-in user
    pub fn spend_credits(&self, amount: u32) -> Result<PublicUser> {
        self.update_current(|user| {
            ensure_credits(user.credits, amount)?;
            user.credits -= amount;
            Ok(())
        })
    }

    /// Fail the way `spend_credits` would, without spending anything
    pub fn check_credits(&self, amount: u32) -> Result<()> {
        let user = self
            .current_user()
            .ok_or_else(|| Error::auth("You are not logged in"))?;
        ensure_credits(user.credits, amount)
    }

    /// Change the logged-in user's plan
    pub fn set_plan(&self, plan: Plan) -> Result<PublicUser> {
        self.update_current(|user| {
            user.plan = plan;
            Ok(())
        })
    }

    fn update_current(
        &self,
        change: impl FnOnce(&mut UserRecord) -> Result<()>,
    ) -> Result<PublicUser> {
        let current = self
            .current_user()
            .ok_or_else(|| Error::auth("You are not logged in"))?;
        let mut users = self.users();
        let user = users
            .iter_mut()
            .find(|user| user.id == current.id)
            .ok_or_else(|| Error::auth("Logged-in account no longer exists"))?;

        change(user)?;
        let public = user.to_public();
        self.store.write_json(keys::USERS, &users)?;
        self.store.write_json(keys::CURRENT_USER, &public)?;
        Ok(public)
    }
}

fn ensure_credits(available: u32, needed: u32) -> Result<()> {
    if available < needed {
        return Err(Error::validation(format!(
            "Not enough credits: {} needed, {} left",
            needed, available
        )));
    }
    Ok(())
}
