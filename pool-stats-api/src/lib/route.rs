//! Request routing over the closed set of API paths.

/// Upper bound (exclusive) on the byte length of a user address.
pub const MAX_USER_ADDRESS_LEN: usize = 100;

/// The request shapes the API answers. Anything else is a miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/` - capability descriptor.
    Capability,
    /// `/api/status` - liveness check.
    Health,
    /// `/api/pool` - pool snapshot.
    PoolStatus,
    /// `/api/users` - aggregate of every user.
    AllUsers,
    /// `/api/users/<address>` - a single user.
    User(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The address segment is empty or too long.
    InvalidUserAddress,
    /// No route matches the path.
    UnknownPath,
}

impl Route {
    /// Match `path` against the route table.
    ///
    /// Exact matches are tried first (each endpoint tolerates one trailing
    /// slash), then the single-user prefix. The HTTP method is checked by
    /// the caller before any path matching happens.
    pub fn parse(path: &str) -> Result<Route, RouteError> {
        match path {
            "/" => Ok(Route::Capability),
            "/api/status" | "/api/status/" => Ok(Route::Health),
            "/api/pool" | "/api/pool/" => Ok(Route::PoolStatus),
            "/api/users" | "/api/users/" => Ok(Route::AllUsers),
            _ => match path.strip_prefix("/api/users/") {
                Some(address) if !address.is_empty() && address.len() < MAX_USER_ADDRESS_LEN => {
                    Ok(Route::User(address.to_string()))
                }
                Some(_) => Err(RouteError::InvalidUserAddress),
                None => Err(RouteError::UnknownPath),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_paths_map_to_their_routes() {
        assert_eq!(Route::parse("/"), Ok(Route::Capability));
        assert_eq!(Route::parse("/api/status"), Ok(Route::Health));
        assert_eq!(Route::parse("/api/pool"), Ok(Route::PoolStatus));
        assert_eq!(Route::parse("/api/users"), Ok(Route::AllUsers));
    }

    #[test]
    fn one_trailing_slash_is_tolerated() {
        assert_eq!(Route::parse("/api/status/"), Ok(Route::Health));
        assert_eq!(Route::parse("/api/pool/"), Ok(Route::PoolStatus));
        assert_eq!(Route::parse("/api/users/"), Ok(Route::AllUsers));
    }

    #[test]
    fn user_address_is_extracted_from_the_suffix() {
        assert_eq!(
            Route::parse("/api/users/bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq"),
            Ok(Route::User(
                "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq".to_string()
            ))
        );
    }

    #[test]
    fn user_address_may_contain_further_slashes() {
        assert_eq!(
            Route::parse("/api/users/extra/part"),
            Ok(Route::User("extra/part".to_string()))
        );
    }

    #[test]
    fn address_length_is_bounded() {
        let longest = "a".repeat(MAX_USER_ADDRESS_LEN - 1);
        assert_eq!(
            Route::parse(&format!("/api/users/{longest}")),
            Ok(Route::User(longest))
        );
        let too_long = "a".repeat(MAX_USER_ADDRESS_LEN);
        assert_eq!(
            Route::parse(&format!("/api/users/{too_long}")),
            Err(RouteError::InvalidUserAddress)
        );
    }

    #[test]
    fn unknown_paths_are_misses() {
        assert_eq!(Route::parse("/nope"), Err(RouteError::UnknownPath));
        assert_eq!(Route::parse("/api"), Err(RouteError::UnknownPath));
        assert_eq!(Route::parse("/api/"), Err(RouteError::UnknownPath));
        assert_eq!(Route::parse("/api/pool/extra"), Err(RouteError::UnknownPath));
        assert_eq!(Route::parse("/api/poolstats"), Err(RouteError::UnknownPath));
        assert_eq!(Route::parse(""), Err(RouteError::UnknownPath));
    }
}
