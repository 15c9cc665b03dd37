use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{FederatedLoginRequest, LoginRequest, RegisterRequest, UpdateUsernameRequest},
    jwt::JwtKeys,
    password::{check_strength, hash_password, random_password, verify_password},
    repo::UserStore,
    repo_types::{NewUser, User},
};
use crate::error::{AppError, AppResult};

/// Federated sign-ups retry this many times when the derived username is taken.
const USERNAME_ATTEMPTS: usize = 3;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Lower-cased display name without whitespace, followed by `suffix`.
pub(crate) fn derive_username(display_name: &str, suffix: u16) -> String {
    let base: String = display_name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    let base = if base.is_empty() { "user".to_string() } else { base };
    format!("{base}{suffix}")
}

fn issue(keys: &JwtKeys, user_id: Uuid) -> AppResult<String> {
    Ok(keys.sign(user_id)?)
}

pub async fn register(
    users: &dyn UserStore,
    keys: &JwtKeys,
    req: RegisterRequest,
) -> AppResult<String> {
    let (Some(username), Some(email), Some(password)) =
        (present(req.username), present(req.email), present(req.password))
    else {
        return Err(AppError::validation("Missing Credentials"));
    };

    let email = normalize_email(&email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::validation("Enter a valid email"));
    }

    check_strength(&password)?;

    let user = users
        .create(NewUser {
            username: username.trim().to_string(),
            email,
            password_hash: hash_password(&password)?,
            avatar: None,
        })
        .await?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    issue(keys, user.id)
}

pub async fn login(users: &dyn UserStore, keys: &JwtKeys, req: LoginRequest) -> AppResult<String> {
    let (Some(email), Some(password)) = (present(req.email), present(req.password)) else {
        return Err(AppError::validation("Email and password are required"));
    };
    let email = normalize_email(&email);

    let Some(user) = users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::not_found("User does not exist"));
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::auth("Invalid credentials"));
    }

    info!(user_id = %user.id, "user logged in");
    issue(keys, user.id)
}

/// Resolves a token to the user id it was issued for.
pub fn verify(keys: &JwtKeys, token: &str) -> AppResult<Uuid> {
    if token.trim().is_empty() {
        return Err(AppError::auth("Not Authorised. Login again"));
    }
    keys.verify(token).map(|claims| claims.sub).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        AppError::auth("Invalid or expired token")
    })
}

/// Signs in a user vouched for by a third-party identity provider.
///
/// Unknown emails get an account on the spot, with a random password nobody
/// knows. The email address is trusted as given.
pub async fn federated_login(
    users: &dyn UserStore,
    keys: &JwtKeys,
    req: FederatedLoginRequest,
) -> AppResult<String> {
    let Some(email) = present(req.email) else {
        return Err(AppError::validation("Email is required"));
    };
    let email = normalize_email(&email);
    if !is_valid_email(&email) {
        return Err(AppError::validation("Enter a valid email"));
    }

    if let Some(user) = users.find_by_email(&email).await? {
        info!(user_id = %user.id, "federated login");
        return issue(keys, user.id);
    }

    let display_name = req.name.unwrap_or_default();
    let password_hash = hash_password(&random_password())?;
    let avatar = present(req.photo);

    let mut last_err = None;
    for _ in 0..USERNAME_ATTEMPTS {
        let suffix = rand::thread_rng().gen_range(1000..10000);
        let new_user = NewUser {
            username: derive_username(&display_name, suffix),
            email: email.clone(),
            password_hash: password_hash.clone(),
            avatar: avatar.clone(),
        };
        match users.create(new_user).await {
            Ok(user) => {
                warn!(user_id = %user.id, "provisioned account from federated login without email verification");
                return issue(keys, user.id);
            }
            Err(AppError::Conflict(msg)) => {
                // the email may have been claimed concurrently
                if let Some(user) = users.find_by_email(&email).await? {
                    return issue(keys, user.id);
                }
                last_err = Some(AppError::Conflict(msg));
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| AppError::Conflict("Username already in use".into())))
}

pub async fn update_username(
    users: &dyn UserStore,
    user_id: Uuid,
    req: UpdateUsernameRequest,
) -> AppResult<User> {
    let Some(username) = present(req.username) else {
        return Err(AppError::validation("Username is required"));
    };

    let user = users
        .update_username(user_id, username.trim())
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    info!(user_id = %user.id, username = %user.username, "username updated");
    Ok(user)
}

pub async fn current_user(users: &dyn UserStore, user_id: Uuid) -> AppResult<User> {
    users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}
