// CORS origin matching with single-wildcard patterns
use actix_cors::Cors;
use actix_web::http::header::HeaderValue;

#[derive(Debug, Clone, PartialEq, Eq)]
enum OriginPattern {
    Exact(String),
    /// `prefix*suffix`; the wildcard matches a non-empty run without `/`
    Wildcard { prefix: String, suffix: String },
}

impl OriginPattern {
    fn parse(pattern: &str) -> Self {
        let pattern = pattern.trim().trim_end_matches('/').to_ascii_lowercase();
        match pattern.split_once('*') {
            Some((prefix, suffix)) => OriginPattern::Wildcard {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
            },
            None => OriginPattern::Exact(pattern),
        }
    }

    fn matches(&self, origin: &str) -> bool {
        match self {
            OriginPattern::Exact(exact) => exact.eq_ignore_ascii_case(origin),
            OriginPattern::Wildcard { prefix, suffix } => {
                let origin = origin.to_ascii_lowercase();
                if origin.len() <= prefix.len() + suffix.len()
                    || !origin.starts_with(prefix.as_str())
                    || !origin.ends_with(suffix.as_str())
                {
                    return false;
                }
                let middle = &origin[prefix.len()..origin.len() - suffix.len()];
                !middle.contains('/')
            }
        }
    }
}

/// Set of allowed browser origins
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    patterns: Vec<OriginPattern>,
}

impl OriginPolicy {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = origins
            .into_iter()
            .filter(|o| !o.as_ref().trim().is_empty())
            .map(|o| OriginPattern::parse(o.as_ref()))
            .collect();
        Self { patterns }
    }

    pub fn allows(&self, origin: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(origin))
    }

    fn allows_header(&self, origin: &HeaderValue) -> bool {
        origin.to_str().map(|o| self.allows(o)).unwrap_or(false)
    }

    /// CORS middleware admitting these origins for GET and POST
    pub fn middleware(&self) -> Cors {
        let policy = self.clone();
        Cors::default()
            .allowed_origin_fn(move |origin, _req| policy.allows_header(origin))
            .allowed_methods(vec!["GET", "POST"])
            .allow_any_header()
            .max_age(3600)
    }
}
