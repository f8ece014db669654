const DEFAULT_COOKIE_NAME: &str = "SESSID";

/// SameSite policy emitted on the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Session configuration, shared by all requests handled with the same store.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name of the cookie that carries the session id
    pub cookie_name: String,
    /// Path attribute of the session cookie
    pub cookie_path: String,
    /// Only send the cookie over HTTPS
    pub secure: bool,
    /// Hide the cookie from client-side scripts
    pub http_only: bool,
    /// SameSite attribute of the session cookie (omitted when `None`)
    pub same_site: Option<SameSite>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_path: "/".to_string(),
            secure: false,
            http_only: true,
            same_site: Some(SameSite::Lax),
        }
    }
}

impl SessionConfig {
    /// Renders the `Set-Cookie` header value announcing `id` to the client.
    pub fn set_cookie_value(&self, id: &str) -> String {
        let mut out = format!("{}={}; Path={}", self.cookie_name, id, self.cookie_path);
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if let Some(same_site) = self.same_site {
            out.push_str("; SameSite=");
            out.push_str(same_site.as_str());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cookie_attributes() {
        let cfg = SessionConfig::default();
        assert_eq!(
            cfg.set_cookie_value("abc"),
            "SESSID=abc; Path=/; HttpOnly; SameSite=Lax"
        );
    }

    #[test]
    fn secure_without_same_site() {
        let cfg = SessionConfig {
            cookie_name: "sid".into(),
            cookie_path: "/app".into(),
            secure: true,
            http_only: false,
            same_site: None,
        };
        assert_eq!(cfg.set_cookie_value("x1"), "sid=x1; Path=/app; Secure");
    }
}
