//! Resource pattern matching
//!
//! Permissions name resources with two kinds of placeholders:
//! 1. Path parameters: `:name` matches one non-empty path segment
//! 2. Wildcards: `*` matches any run of characters up to the next literal
//!    in the pattern, or everything when it ends the pattern
//!
//! Matching is a single forward scan over both strings. There is no
//! backtracking, so a mid-pattern `*` binds to the first occurrence of the
//! literal that follows it.

/// Checks if a value matches a resource pattern
///
/// # Arguments
///
/// * `value` - The concrete string (e.g. `"/coding/42/open"`)
/// * `pattern` - The pattern, possibly containing `:param` and `*`
///
/// # Returns
///
/// `true` when both strings are fully consumed by the scan
///
/// # Examples
///
/// ```rust
/// use tenant_authz::pattern::matches;
///
/// assert!(matches("/coding/1/2/start-coding", "/coding/:wid/:eid/start-coding"));
/// assert!(matches("/admin/principal/add", "/admin/*"));
/// assert!(!matches("/coding/1/open", "/coding/:wid/close"));
/// ```
pub fn matches(value: &str, pattern: &str) -> bool {
    let value = value.as_bytes();
    let pattern = pattern.as_bytes();
    let (mut vi, mut pi) = (0usize, 0usize);

    while pi < pattern.len() {
        match pattern[pi] {
            b'*' => {
                while pi < pattern.len() && pattern[pi] == b'*' {
                    pi += 1;
                }
                if pi == pattern.len() {
                    return true;
                }
                let literal = pattern[pi];
                match value[vi..].iter().position(|&b| b == literal) {
                    Some(offset) => vi += offset,
                    None => return false,
                }
            }
            b':' => {
                // A parameter binds a non-empty segment
                if vi >= value.len() || value[vi] == b'/' {
                    return false;
                }
                while pi < pattern.len() && pattern[pi] != b'/' {
                    pi += 1;
                }
                while vi < value.len() && value[vi] != b'/' {
                    vi += 1;
                }
            }
            literal => {
                if vi < value.len() && value[vi] == literal {
                    vi += 1;
                    pi += 1;
                } else {
                    return false;
                }
            }
        }
    }

    vi == value.len()
}

/// Checks if a requested activity matches a permission key
///
/// Both sides are `"<resource> <action>"` strings. Resource and action are
/// matched separately so a trailing parameter in the resource can never
/// consume the action. A pattern with an empty action accepts any action;
/// strings without an action part are matched whole.
///
/// # Examples
///
/// ```rust
/// use tenant_authz::pattern::match_resource;
///
/// assert!(match_resource("/users/7 GET", "/users/:id GET"));
/// assert!(!match_resource("/users/7 DELETE", "/users/:id GET"));
/// assert!(match_resource("/users/7 DELETE", "/users/:id *"));
/// ```
pub fn match_resource(request: &str, pattern: &str) -> bool {
    if request == pattern {
        return true;
    }

    match (request.rsplit_once(' '), pattern.rsplit_once(' ')) {
        (_, Some((resource_pattern, ""))) => {
            let resource = request.rsplit_once(' ').map_or(request, |(resource, _)| resource);
            matches(resource, resource_pattern)
        }
        (Some((resource, action)), Some((resource_pattern, action_pattern))) => {
            matches(resource, resource_pattern) && matches(action, action_pattern)
        }
        _ => matches(request, pattern),
    }
}
