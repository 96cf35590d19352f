use crate::domain::UserId;

/// An empty allowlist leaves the bot open to everyone.
pub fn is_authorized(user_id: Option<UserId>, allowed_users: &[i64]) -> bool {
    if allowed_users.is_empty() {
        return true;
    }
    let Some(UserId(id)) = user_id else {
        return false;
    };
    allowed_users.contains(&id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allowlist_allows_everyone() {
        assert!(is_authorized(Some(UserId(7)), &[]));
        assert!(is_authorized(None, &[]));
    }

    #[test]
    fn allowlist_is_enforced() {
        assert!(is_authorized(Some(UserId(7)), &[1, 7]));
        assert!(!is_authorized(Some(UserId(8)), &[1, 7]));
        assert!(!is_authorized(None, &[1, 7]));
    }
}
