use reqwest::Proxy;

/// Basic credentials for an authenticating proxy
#[derive(Debug, Clone)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

/// Explicit proxy for all outgoing requests.
///
/// The scheme of `url` selects the proxy kind: `http://`, `https://` or
/// `socks5://`. A bare `host:port` is treated as an HTTP proxy.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub url: String,
    pub auth: Option<ProxyAuth>,
}

impl ProxyConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth: None,
        }
    }

    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(ProxyAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Proxy URL with an explicit scheme
    pub fn normalized_url(&self) -> String {
        if self.url.contains("://") {
            self.url.clone()
        } else {
            format!("http://{}", self.url)
        }
    }
}

/// Build the reqwest proxy covering every request scheme
pub fn build_proxy_from_config(config: &ProxyConfig) -> Result<Proxy, String> {
    let url = config.normalized_url();
    let mut proxy = Proxy::all(&url).map_err(|e| format!("Invalid proxy URL '{url}': {e}"))?;

    if let Some(auth) = &config.auth {
        proxy = proxy.basic_auth(&auth.username, &auth.password);
    }

    Ok(proxy)
}
