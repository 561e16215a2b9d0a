use nostr::{Event, EventBuilder, Keys, SecretKey};

use crate::error::HookError;
use crate::events::AnnouncementDraft;

const SECRET_KEY_HEX_LEN: usize = 64;

/// Parse a hex secret key from configuration.
///
/// Only the 64 character hex form is accepted, matching what
/// `git config nostr.privkey` is documented to hold.
pub fn parse_secret_key(secret_hex: &str) -> Result<Keys, HookError> {
    let secret_hex = secret_hex.trim();
    if secret_hex.len() != SECRET_KEY_HEX_LEN {
        return Err(HookError::Configuration(format!(
            "nostr.privkey must be {SECRET_KEY_HEX_LEN} hex characters, got {len}",
            len = secret_hex.len()
        )));
    }

    let bytes = hex::decode(secret_hex)
        .map_err(|e| HookError::Configuration(format!("nostr.privkey is not valid hex: {e}")))?;

    let secret_key = SecretKey::from_slice(&bytes)
        .map_err(|e| HookError::Configuration(format!("nostr.privkey is not a valid key: {e}")))?;

    Ok(Keys::new(secret_key))
}

/// Sign an announcement draft, producing the event id, pubkey and signature
pub fn sign(draft: AnnouncementDraft, keys: &Keys) -> Result<Event, HookError> {
    EventBuilder::new(draft.kind, draft.content)
        .tags(draft.tags)
        .custom_created_at(draft.created_at)
        .sign_with_keys(keys)
        .map_err(|e| HookError::Signing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{FixedClock, build_announcement};
    use crate::types::{BranchRef, RepositoryFacts};
    use sha2::{Digest, Sha256};

    const TEST_KEY: &str = "0000000000000000000000000000000000000000000000000000000000000001";

    fn facts() -> RepositoryFacts {
        RepositoryFacts {
            name: "demo".to_string(),
            remote_url: Some("git@github.com:nostrapps/demo.git".to_string()),
            current_branch: "main".to_string(),
            commit_subject: Some("Initial commit".to_string()),
            branch_refs: vec![BranchRef::new(
                "refs/heads/main",
                "0123456789abcdef0123456789abcdef01234567",
            )],
        }
    }

    #[test]
    fn test_pubkey_derivation() {
        let keys = parse_secret_key(TEST_KEY).unwrap();
        assert_eq!(
            keys.public_key().to_hex(),
            "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let keys = parse_secret_key(&format!("  {TEST_KEY}\n")).unwrap();
        assert_eq!(keys.public_key(), parse_secret_key(TEST_KEY).unwrap().public_key());
    }

    #[test]
    fn test_rejects_bad_keys() {
        let cases = vec![
            String::new(),
            "abcd".to_string(),
            "zz".repeat(32),
            "00".repeat(32),
            "ff".repeat(32),
            "01".repeat(33),
        ];

        for case in &cases {
            let err = parse_secret_key(case).unwrap_err();
            assert!(
                matches!(err, HookError::Configuration(_)),
                "expected configuration error for {case:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_signing_is_content_addressed() {
        let keys = parse_secret_key(TEST_KEY).unwrap();
        let clock = FixedClock(1_700_000_000);

        let first = sign(build_announcement(&facts(), &clock), &keys).unwrap();
        let second = sign(build_announcement(&facts(), &clock), &keys).unwrap();

        assert_eq!(first.pubkey, second.pubkey);
        assert_eq!(first.id, second.id);
        assert!(first.verify().is_ok());
        assert!(second.verify().is_ok());
    }

    #[test]
    fn test_signed_fields_match_draft() {
        let keys = parse_secret_key(TEST_KEY).unwrap();
        let draft = build_announcement(&facts(), &FixedClock(1_700_000_000));
        let rows = draft.tag_rows();
        let event = sign(draft, &keys).unwrap();

        assert_eq!(event.kind.as_u16(), 30617);
        assert_eq!(event.created_at.as_u64(), 1_700_000_000);
        assert_eq!(event.content, "Latest commit: Initial commit");
        let signed_rows: Vec<Vec<String>> =
            event.tags.iter().map(|t| t.as_slice().to_vec()).collect();
        assert_eq!(signed_rows, rows);
    }

    #[test]
    fn test_id_is_sha256_of_nip01_serialization() {
        let keys = parse_secret_key(TEST_KEY).unwrap();
        let event = sign(build_announcement(&facts(), &FixedClock(1_700_000_000)), &keys).unwrap();

        let tags: Vec<Vec<String>> = event.tags.iter().map(|t| t.as_slice().to_vec()).collect();
        let canonical = serde_json::json!([
            0,
            event.pubkey.to_hex(),
            event.created_at.as_u64(),
            event.kind.as_u16(),
            tags,
            event.content,
        ]);
        let digest = Sha256::digest(serde_json::to_string(&canonical).unwrap().as_bytes());

        assert_eq!(event.id.to_hex(), hex::encode(digest));
    }

    #[test]
    fn test_different_clock_changes_id() {
        let keys = parse_secret_key(TEST_KEY).unwrap();
        let a = sign(build_announcement(&facts(), &FixedClock(1)), &keys).unwrap();
        let b = sign(build_announcement(&facts(), &FixedClock(2)), &keys).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.pubkey, b.pubkey);
    }
}
