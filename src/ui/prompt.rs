//! Password prompts.

use anyhow::{Context, Result};
use inquire::{Password, PasswordDisplayMode, min_length, required};

pub struct Prompt {
    password_min_length: usize,
}

impl Prompt {
    pub const fn new(password_min_length: usize) -> Self {
        Self { password_min_length }
    }

    /// Asks twice; a mismatch re-prompts instead of failing.
    pub fn encryption_password(&self) -> Result<String> {
        Password::new("Enter encryption password:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .with_validator(min_length!(self.password_min_length, "password is too short"))
            .with_custom_confirmation_message("Confirm password:")
            .with_custom_confirmation_error_message("passwords do not match")
            .prompt()
            .context("failed to read encryption password")
    }

    /// Asks once. A wrong password surfaces as a decryption failure.
    pub fn decryption_password(&self) -> Result<String> {
        Password::new("Enter decryption password:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .with_validator(required!("password cannot be empty"))
            .without_confirmation()
            .prompt()
            .context("failed to read decryption password")
    }
}
