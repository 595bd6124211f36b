//! Token requests.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::{Client, Result};

/// Token request body.
#[derive(Serialize)]
struct LoginOptions<'a> {
    /// Credentials.
    user: LoginUser<'a>,
    /// Application identifier the token is issued for.
    identifier: &'a str,
}

/// Credentials nested in [`LoginOptions`].
#[derive(Serialize)]
struct LoginUser<'a> {
    /// Account email.
    email: &'a str,
    /// Account password.
    password: &'a str,
}

/// Token response body.
#[derive(Deserialize)]
struct LoginToken {
    /// Issued token.
    token: String,
}

impl Client {
    /// Exchange credentials for an API token.
    ///
    /// The returned token is also installed on this client when it has none yet.
    pub async fn authenticate(&mut self, email: &str, password: &str) -> Result<String> {
        let opts = LoginOptions {
            user: LoginUser { email, password },
            identifier: &self.identifier,
        };
        let issued: LoginToken = self
            .send(Method::POST, "user/request_token", Some(&opts))
            .await?;
        if !self.has_token() {
            self.token = issued.token.clone();
        }
        Ok(issued.token)
    }
}
