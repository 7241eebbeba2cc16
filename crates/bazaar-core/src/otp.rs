//! One-time verification codes for registration and password reset.
//!
//! One outstanding code per flow: reissuing replaces the previous code.
//! Codes are 6 numeric digits and expire 300 seconds after issuance.
//! Verification compares the submitted code against the most-recently-issued
//! one for the flow, then checks the expiry timestamp.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::debug;

use crate::error::{MarketError, Result};
use crate::Marketplace;

pub const OTP_TTL_SECONDS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OtpPurpose {
    Register,
    PasswordReset,
}

#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub code: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

fn generate_code() -> String {
    rand::rng().random_range(100_000..1_000_000).to_string()
}

impl Marketplace {
    /// There is no mail infrastructure: the code is returned to the caller,
    /// which presents it in place of a delivered email.
    pub(crate) fn issue_otp_at(
        &mut self,
        purpose: OtpPurpose,
        email: &str,
        now: DateTime<Utc>,
    ) -> String {
        let code = generate_code();
        self.otps.insert(
            purpose,
            IssuedOtp {
                code: code.clone(),
                email: email.to_string(),
                expires_at: now + Duration::seconds(OTP_TTL_SECONDS),
            },
        );
        debug!(?purpose, email, "verification code issued");
        code
    }

    /// Consumes the outstanding code on success. An unknown or mismatched
    /// code is `InvalidOtp` even when the issue has also lapsed; expiry is
    /// only reported for the correct code.
    pub(crate) fn verify_otp_at(
        &mut self,
        purpose: OtpPurpose,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let issued = self.otps.get(&purpose).ok_or(MarketError::InvalidOtp)?;
        if issued.code != code {
            return Err(MarketError::InvalidOtp);
        }
        if now > issued.expires_at {
            return Err(MarketError::OtpExpired);
        }
        self.otps.remove(&purpose);
        Ok(())
    }
}
