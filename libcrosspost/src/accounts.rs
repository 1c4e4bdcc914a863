//! Login-service boundary
//!
//! Posting tasks gate every attempt on a fresh login check but do not own
//! credentials or sessions; they consume this trait as a black box. The
//! registry-backed implementation resolves the account and asks its
//! destination, which is the common wiring. The static implementation exists
//! for tests and offline runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::destinations::DestinationRegistry;
use crate::error::{DestinationError, Result};
use crate::types::{LoginStatus, UserAccount};

#[async_trait]
pub trait LoginService: Send + Sync {
    /// Fetch a fresh login status for the account. Results are never cached
    /// at this layer; a posting attempt must not trust an earlier check.
    async fn check_login(&self, account_id: &str) -> Result<LoginStatus>;
}

/// Resolves accounts against the destination registry and delegates the check
/// to the destination adapter.
pub struct RegistryLoginService {
    destinations: Arc<DestinationRegistry>,
    accounts: HashMap<String, UserAccount>,
}

impl RegistryLoginService {
    pub fn new(destinations: Arc<DestinationRegistry>) -> Self {
        Self {
            destinations,
            accounts: HashMap::new(),
        }
    }

    pub fn add_account(&mut self, account: UserAccount) {
        self.accounts.insert(account.id.clone(), account);
    }

    pub fn account(&self, account_id: &str) -> Option<&UserAccount> {
        self.accounts.get(account_id)
    }
}

#[async_trait]
impl LoginService for RegistryLoginService {
    async fn check_login(&self, account_id: &str) -> Result<LoginStatus> {
        let account = self.accounts.get(account_id).ok_or_else(|| {
            DestinationError::Authentication(format!("unknown account: {}", account_id))
        })?;

        let destination = self.destinations.get(&account.destination).ok_or_else(|| {
            DestinationError::Authentication(format!(
                "account {} references unregistered destination: {}",
                account_id, account.destination
            ))
        })?;

        destination.check_login_status(account).await
    }
}

/// Always answers with a fixed status. Test and offline wiring only.
pub struct StaticLoginService {
    status: LoginStatus,
}

impl StaticLoginService {
    pub fn logged_in(username: &str) -> Self {
        Self {
            status: LoginStatus {
                logged_in: true,
                username: Some(username.to_string()),
            },
        }
    }

    pub fn logged_out() -> Self {
        Self {
            status: LoginStatus::not_logged_in(),
        }
    }
}

#[async_trait]
impl LoginService for StaticLoginService {
    async fn check_login(&self, _account_id: &str) -> Result<LoginStatus> {
        Ok(self.status.clone())
    }
}
