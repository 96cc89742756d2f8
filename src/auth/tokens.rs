use rand::{rngs::OsRng, RngCore};
use tracing::debug;
use uuid::Uuid;

use crate::store::{Store, StoreResult};

const KEY_BYTES: usize = 20;

/// Random opaque key, 40 lowercase hex characters.
pub fn generate_key() -> String {
    let mut bytes = [0u8; KEY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Returns the user's token, minting one on first use.
pub async fn issue(store: &dyn Store, user_id: Uuid) -> StoreResult<String> {
    let key = store.get_or_create_token(user_id, &generate_key()).await?;
    debug!(user_id = %user_id, "token issued");
    Ok(key)
}

/// Pulls the key out of `Token <key>` or `Bearer <key>`.
pub fn parse_authorization(header: &str) -> Option<&str> {
    let (scheme, key) = header.trim().split_once(' ')?;
    let key = key.trim();
    let known = scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer");
    (known && !key.is_empty() && !key.contains(' ')).then_some(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn keys_are_forty_hex_chars_and_distinct() {
        let a = generate_key();
        let b = generate_key();
        assert_eq!(a.len(), 40);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }

    #[test]
    fn parses_token_and_bearer_schemes() {
        assert_eq!(parse_authorization("Token abc123"), Some("abc123"));
        assert_eq!(parse_authorization("Bearer abc123"), Some("abc123"));
        assert_eq!(parse_authorization("bearer abc123"), Some("abc123"));
        assert_eq!(parse_authorization("Basic abc123"), None);
        assert_eq!(parse_authorization("Token"), None);
        assert_eq!(parse_authorization("Token "), None);
        assert_eq!(parse_authorization("Token a b"), None);
    }

    #[tokio::test]
    async fn issue_reuses_existing_token() {
        let store = MemoryStore::new();
        let user = store
            .create_user("alice", "alice@example.com", "hash")
            .await
            .unwrap();
        let first = issue(&store, user.id).await.unwrap();
        let second = issue(&store, user.id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.resolve_token(&first).await.unwrap(), Some(user.id));
    }
}
