//! Liberal URI parsing and base-string URI normalization
//! (RFC 5849 section 3.4.1.2).

/// A parsed URI.
///
/// Parsing never fails: anything that does not look like a scheme or an
/// authority ends up in `path`. Scheme and host are stored lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uri {
    pub scheme: Option<String>,
    pub userinfo: Option<String>,
    pub host: Option<String>,
    /// Port exactly as written, numeric or not.
    pub port: Option<String>,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
    /// Scheme followed by something other than `//` (e.g. `urn:isbn:...`).
    pub opaque: bool,
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
        }
        _ => false,
    }
}

impl Uri {
    /// Parse a URI string.
    ///
    /// Order: fragment, query, scheme, then authority.
    pub fn parse(input: &str) -> Self {
        let mut uri = Uri::default();
        let mut rest = input;

        if let Some((before, fragment)) = rest.split_once('#') {
            uri.fragment = non_empty(fragment);
            rest = before;
        }

        if let Some((before, query)) = rest.split_once('?') {
            uri.query = non_empty(query);
            rest = before;
        }

        if let Some(network_path) = rest.strip_prefix("//") {
            rest = uri.parse_authority(network_path);
        } else if let Some((scheme, after)) = rest.split_once(':') {
            if is_scheme(scheme) {
                let scheme = scheme.to_ascii_lowercase();
                if scheme == "file" {
                    rest = after.strip_prefix("//").unwrap_or(after);
                } else if let Some(authority) = after.strip_prefix("//") {
                    rest = uri.parse_authority(authority);
                } else {
                    uri.opaque = true;
                    rest = after;
                }
                uri.scheme = Some(scheme);
            }
        }

        uri.path = rest.to_string();
        uri
    }

    /// Split `userinfo@host:port` off the front and return the remaining path.
    fn parse_authority<'a>(&mut self, input: &'a str) -> &'a str {
        let first_slash = input.find('/').unwrap_or(input.len());
        let mut rest = input;

        if let Some(at) = input[..first_slash].rfind('@') {
            self.userinfo = non_empty(&input[..at]);
            rest = &input[at + 1..];
        }

        let end = rest.find('/').unwrap_or(rest.len());
        let host_port = &rest[..end];

        if let Some(bracketed) = host_port.strip_prefix('[') {
            match bracketed.split_once(']') {
                Some((host, after)) => {
                    self.host = non_empty(host);
                    self.port = after.strip_prefix(':').and_then(non_empty);
                }
                None => self.host = non_empty(bracketed),
            }
        } else if host_port.matches(':').count() > 1 {
            self.host = non_empty(host_port);
        } else {
            match host_port.split_once(':') {
                Some((host, port)) => {
                    self.host = non_empty(host);
                    self.port = non_empty(port);
                }
                None => self.host = non_empty(host_port),
            }
        }

        self.host = self.host.take().map(|h| h.to_ascii_lowercase());

        match &rest[end..] {
            "" => "/",
            path => path,
        }
    }

    /// Default port for the scheme, if it has one.
    pub fn default_port(&self) -> Option<&'static str> {
        match self.scheme.as_deref() {
            Some("http") => Some("80"),
            Some("https") => Some("443"),
            _ => None,
        }
    }

    fn explicit_port(&self) -> Option<&str> {
        self.port
            .as_deref()
            .filter(|port| Some(*port) != self.default_port())
    }

    fn write_without_query(&self, out: &mut String) {
        if let Some(scheme) = &self.scheme {
            out.push_str(scheme);
            out.push(':');
        }

        if self.opaque {
            out.push_str(&self.path);
            return;
        }

        if let Some(host) = &self.host {
            out.push_str("//");
            if let Some(userinfo) = &self.userinfo {
                out.push_str(userinfo);
                out.push('@');
            }
            if host.contains(':') {
                out.push('[');
                out.push_str(host);
                out.push(']');
            } else {
                out.push_str(host);
            }
            if let Some(port) = self.explicit_port() {
                out.push(':');
                out.push_str(port);
            }
        }

        out.push_str(&self.path);
    }

    /// `scheme://host[:port]path` as used in the signature base string.
    ///
    /// Default ports are dropped, query and fragment excluded, an empty
    /// path becomes `/`. Userinfo is never part of the result.
    pub fn normalized_absolute_uri(&self) -> String {
        let mut out = String::new();
        if let Some(scheme) = &self.scheme {
            out.push_str(scheme);
            out.push(':');
        }

        if self.opaque {
            out.push_str(&self.path);
            return out;
        }

        if let Some(host) = &self.host {
            out.push_str("//");
            if host.contains(':') {
                out.push('[');
                out.push_str(host);
                out.push(']');
            } else {
                out.push_str(host);
            }
            if let Some(port) = self.explicit_port() {
                out.push(':');
                out.push_str(port);
            }
        }

        if self.path.is_empty() {
            out.push('/');
        } else {
            out.push_str(&self.path);
        }
        out
    }

    /// Reassemble the full URI, query and fragment included.
    pub fn build(&self) -> String {
        let mut out = String::new();
        self.write_without_query(&mut out);

        if let Some(query) = &self.query {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = &self.fragment {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }
}

impl std::fmt::Display for Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.build())
    }
}

impl From<&str> for Uri {
    fn from(input: &str) -> Self {
        Uri::parse(input)
    }
}
