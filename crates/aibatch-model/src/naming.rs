//! Deterministic, length-bounded resource names.
//!
//! Cloud resource names accept lowercase letters, digits and hyphens with a
//! per-type length limit. Names here are built from a caller supplied base and
//! a suffix that usually encodes the resource kind (`bucket`, `iam-member`).
//! When the result would be too long the base is shortened and the suffix is
//! kept, so two resources of different kinds never collapse into one name.

/// Upper bound for most resource names (buckets, logical resource names).
pub const MAX_RESOURCE_NAME_LEN: usize = 63;

/// Upper bound for service account ids.
pub const MAX_ACCOUNT_ID_LEN: usize = 30;

/// Build `<base>-<suffix>` restricted to `[a-z0-9-]` and at most `max_len` bytes.
///
/// Invalid characters become hyphens, runs of hyphens collapse and leading or
/// trailing hyphens are trimmed. If the suffix alone does not fit, the suffix
/// itself is truncated.
///
/// ```
/// use aibatch_model::compose_name;
///
/// assert_eq!(compose_name("My Batch", "bucket", 63), "my-batch-bucket");
/// assert_eq!(compose_name("a-very-long-component-name", "bucket", 18), "a-very-long-bucket");
/// ```
pub fn compose_name(base: &str, suffix: &str, max_len: usize) -> String {
    let base = sanitize(base);
    let suffix = sanitize(suffix);

    if suffix.is_empty() {
        return truncate(&base, max_len);
    }
    if base.is_empty() || suffix.len() + 1 >= max_len {
        return truncate(&suffix, max_len);
    }

    let head = truncate(&base, max_len - suffix.len() - 1);
    if head.is_empty() {
        return truncate(&suffix, max_len);
    }
    format!("{head}-{suffix}")
}

/// Name generator bound to one component.
///
/// Every name is prefixed with the component name, which is what makes names
/// unique across deployments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namer {
    base: String,
}

impl Namer {
    /// Creates a namer for `component`.
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            base: component.into(),
        }
    }

    /// Component name this namer prefixes.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// `<component>-<name>-<suffix>` bounded to `max_len`.
    ///
    /// `name` and `suffix` may be empty. Only the component part is shortened;
    /// `<name>-<suffix>` is cut only when it does not fit on its own.
    pub fn resource_name(&self, name: &str, suffix: &str, max_len: usize) -> String {
        let tail = match (name.is_empty(), suffix.is_empty()) {
            (true, _) => suffix.to_string(),
            (false, true) => name.to_string(),
            (false, false) => format!("{name}-{suffix}"),
        };
        compose_name(&self.base, &tail, max_len)
    }
}

fn sanitize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// `s` is sanitized ASCII, so byte slicing is safe.
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    s[..max_len].trim_end_matches('-').to_string()
}
