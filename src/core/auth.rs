//! Account registration and credential checks.

use crate::{
    core::{
        Collection, Store,
        id::generate_id,
        models::{Role, User},
    },
    errors::{Error, Result},
};

/// Registers a new user and returns it.
///
/// # Errors
/// Returns [`Error::DuplicateEmail`] if a user with this email already exists.
pub fn register(
    store: &mut Store,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<User> {
    if store.user_by_email(email).is_some() {
        return Err(Error::DuplicateEmail {
            email: email.to_string(),
        });
    }

    let user = User {
        id: generate_id(),
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        role,
    };
    store.users.push(user.clone());
    store.mark(Collection::Users);
    Ok(user)
}

/// Returns the user whose email and password both match exactly.
///
/// # Errors
/// Returns [`Error::InvalidCredentials`] when there is no such user.
pub fn authenticate(store: &Store, email: &str, password: &str) -> Result<User> {
    store
        .users
        .iter()
        .find(|u| u.email == email && u.password == password)
        .cloned()
        .ok_or(Error::InvalidCredentials)
}

/// Resolves a stored session marker against the current users.
///
/// Only the email of the marker is trusted; the returned record is the one
/// held by the store.
#[must_use]
pub fn resolve_session(store: &Store, marker: &User) -> Option<User> {
    store.user_by_email(&marker.email).cloned()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_register_duplicate_email_leaves_first_user() -> Result<()> {
        let mut store = Store::default();
        let first = register(&mut store, "A", "a@x.com", "pw", Role::Student)?;
        store.take_dirty();

        let second = register(&mut store, "Impostor", "a@x.com", "other", Role::Admin);
        assert!(matches!(second, Err(Error::DuplicateEmail { ref email }) if email == "a@x.com"));
        assert_eq!(store.users(), &[first]);
        assert!(store.take_dirty().is_empty());
        Ok(())
    }

    #[test]
    fn test_authenticate_requires_exact_match() -> Result<()> {
        let mut store = Store::default();
        register(&mut store, "A", "a@x.com", "pw", Role::Student)?;

        assert_eq!(authenticate(&store, "a@x.com", "pw")?.name, "A");
        assert!(matches!(
            authenticate(&store, "a@x.com", "PW"),
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&store, "b@x.com", "pw"),
            Err(Error::InvalidCredentials)
        ));
        Ok(())
    }

    #[test]
    fn test_resolve_session_uses_store_record() -> Result<()> {
        let mut store = Store::default();
        let user = register(&mut store, "A", "a@x.com", "pw", Role::Student)?;

        let stale = User {
            name: "Old name".to_string(),
            ..user.clone()
        };
        assert_eq!(resolve_session(&store, &stale).unwrap(), user);

        let unknown = User {
            email: "ghost@x.com".to_string(),
            ..user
        };
        assert!(resolve_session(&store, &unknown).is_none());
        Ok(())
    }
}
