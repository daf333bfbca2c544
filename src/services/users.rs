//! User account service: signup, authentication, OTP flows and the
//! account deletion cascade

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{
        ChangePassword, Role, Signup, UpdateProfile, User, UserClaims, UserQuery, UserShort,
    },
    repository::Repository,
    services::email::EmailService,
};

/// Minutes an emailed OTP stays valid
const OTP_VALIDITY_MINUTES: i64 = 5;

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.+-]+@[\w-]+(\.[\w-]+)+$").expect("invalid email regex"));

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
    email: EmailService,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig, email: EmailService) -> Self {
        Self {
            repository,
            config,
            email,
        }
    }

    /// Register a new account. A matching admin signup code promotes the
    /// account to the admin role; otherwise everyone starts as a student.
    pub async fn signup(&self, request: &Signup) -> AppResult<User> {
        self.check_email_policy(&request.email)?;

        if self.repository.users.email_exists(&request.email).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let role = match (&request.admin_code, &self.config.admin_signup_code) {
            (Some(code), Some(expected)) if code == expected => {
                tracing::info!("Admin signup code matched for {}", request.email);
                Role::Admin
            }
            _ => Role::Student,
        };

        let password_hash = self.hash_password(&request.password)?;
        self.repository.users.create(request, &password_hash, role).await
    }

    /// Authenticate by email and password; returns the access token, the
    /// persisted refresh token and the user.
    pub async fn signin(&self, email: &str, password: &str) -> AppResult<(String, String, User)> {
        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !self.verify_password(&user.password, password)? {
            return Err(AppError::Authentication("Invalid email or password".to_string()));
        }

        let access_token = self.create_access_token(&user)?;

        let refresh_token = random_token();
        let expiry = Utc::now() + Duration::days(self.config.refresh_token_days);
        self.repository
            .refresh_tokens
            .insert(&refresh_token, user.id, expiry)
            .await?;

        Ok((access_token, refresh_token, user))
    }

    /// Exchange a stored refresh token for a new access token. Expired
    /// tokens are deleted on sight.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> AppResult<String> {
        let stored = self
            .repository
            .refresh_tokens
            .find(refresh_token)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid refresh token".to_string()))?;

        if stored.expiry_date < Utc::now() {
            self.repository.refresh_tokens.delete(refresh_token).await?;
            return Err(AppError::Authentication("Refresh token expired".to_string()));
        }

        let user = self.repository.users.get_by_id(stored.user_id).await?;
        self.create_access_token(&user)
    }

    /// Drop the presented refresh token
    pub async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        self.repository.refresh_tokens.delete(refresh_token).await
    }

    /// Get a user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Search users with pagination
    pub async fn search(&self, query: &UserQuery) -> AppResult<(Vec<UserShort>, i64)> {
        self.repository.users.search(query).await
    }

    /// Update the current user's profile
    pub async fn update_profile(&self, id: i32, profile: &UpdateProfile) -> AppResult<User> {
        self.repository.users.update_profile(id, profile).await
    }

    /// Change the current user's password and revoke every session
    pub async fn change_password(&self, id: i32, request: &ChangePassword) -> AppResult<()> {
        if request.current_password == request.new_password {
            return Err(AppError::Validation(
                "New password cannot be the same as the current password".to_string(),
            ));
        }

        let user = self.repository.users.get_by_id(id).await?;
        if !self.verify_password(&user.password, &request.current_password)? {
            return Err(AppError::Authentication("Invalid current password".to_string()));
        }

        let hash = self.hash_password(&request.new_password)?;
        self.repository.users.set_password(id, &hash).await?;
        self.repository.refresh_tokens.revoke_for_user(id).await?;
        Ok(())
    }

    /// Generate an OTP for email verification or password reset, store it
    /// with a short expiry and email it to the user.
    pub async fn request_otp(&self, email: &str, reset: bool) -> AppResult<()> {
        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let otp = generate_otp();
        let expiry = Utc::now() + Duration::minutes(OTP_VALIDITY_MINUTES);
        self.repository.users.set_otp(user.id, &otp, expiry).await?;

        if reset {
            self.email.send_password_reset_otp(&user.email, &otp).await?;
        } else {
            self.email.send_verification_otp(&user.email, &otp).await?;
        }

        Ok(())
    }

    /// Verify an OTP. Marks the email verified; when `new_password` is
    /// supplied the password is reset and every session is revoked.
    pub async fn verify_otp(
        &self,
        email: &str,
        otp: &str,
        new_password: Option<&str>,
    ) -> AppResult<()> {
        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        match user.otp.as_deref() {
            Some(stored) if stored == otp => {}
            _ => return Err(AppError::Forbidden("Invalid OTP".to_string())),
        }

        match user.otp_expiry {
            Some(expiry) if expiry >= Utc::now() => {}
            _ => {
                self.repository.users.clear_otp(user.id).await?;
                return Err(AppError::Validation("OTP has expired".to_string()));
            }
        }

        if let Some(password) = new_password {
            if password.len() < 8 {
                return Err(AppError::Validation(
                    "New password must be at least 8 characters".to_string(),
                ));
            }
            let hash = self.hash_password(password)?;
            self.repository.users.consume_otp(user.id, Some(&hash)).await?;
            self.repository.refresh_tokens.revoke_for_user(user.id).await?;
        } else {
            self.repository.users.consume_otp(user.id, None).await?;
        }

        Ok(())
    }

    /// Delete a user account and cascade to their sessions, wishlist and
    /// loan history, all in one transaction. Admins cannot delete their
    /// own account, and accounts holding open loans are refused.
    pub async fn delete_user(&self, acting: &UserClaims, user_id: i32) -> AppResult<()> {
        if acting.user_id == user_id {
            return Err(AppError::Forbidden(
                "Administrators cannot delete their own account".to_string(),
            ));
        }

        let mut tx = self.repository.pool.begin().await?;

        let user = self
            .repository
            .users
            .find_by_id(&mut tx, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;

        let open_loans = self
            .repository
            .loans
            .count_open_for_user(&mut tx, user_id)
            .await?;
        if open_loans > 0 {
            return Err(AppError::Conflict(format!(
                "User has {} book(s) issued",
                open_loans
            )));
        }

        self.repository
            .refresh_tokens
            .delete_for_user(&mut tx, user_id)
            .await?;
        self.repository
            .wishlists
            .delete_for_user(&mut tx, user_id)
            .await?;
        let loans_removed = self
            .repository
            .loans
            .delete_for_user(&mut tx, user_id)
            .await?;
        self.repository.users.delete(&mut tx, user_id).await?;

        tx.commit().await?;

        tracing::info!(
            "Deleted user id={} email={} ({} loan records removed)",
            user_id,
            user.email,
            loans_removed
        );

        Ok(())
    }

    fn create_access_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            role: user.role,
            exp: now + self.config.access_token_minutes * 60,
            iat: now,
        };
        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn check_email_policy(&self, email: &str) -> AppResult<()> {
        if !EMAIL_SHAPE.is_match(email) {
            return Err(AppError::Validation("Invalid email format".to_string()));
        }
        if let Some(ref domain) = self.config.allowed_email_domain {
            if !email
                .rsplit_once('@')
                .map(|(_, d)| d.eq_ignore_ascii_case(domain))
                .unwrap_or(false)
            {
                return Err(AppError::Validation(format!(
                    "Email must belong to the {} domain",
                    domain
                )));
            }
        }
        Ok(())
    }

    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    fn verify_password(&self, hash: &str, password: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

/// Six random decimal digits
fn generate_otp() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", code)
}

/// Opaque refresh token; validity lives server-side in the token table
fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn refresh_tokens_are_opaque_and_distinct() {
        let a = random_token();
        let b = random_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn email_shape_accepts_plain_addresses() {
        assert!(EMAIL_SHAPE.is_match("reader@example.edu"));
        assert!(EMAIL_SHAPE.is_match("first.last+tag@sub.example.org"));
        assert!(!EMAIL_SHAPE.is_match("not-an-email"));
        assert!(!EMAIL_SHAPE.is_match("missing@tld"));
    }
}
