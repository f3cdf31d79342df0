//! Test fixtures
//!
//! Tokens and identities for end-to-end tests.

use pos_common::JwtService;
use pos_core::{Identity, Role};

/// Secret every test server is started with
pub const TEST_SECRET: &str = "integration-test-secret";

/// Token validator matching the test server
pub fn jwt() -> JwtService {
    JwtService::new(TEST_SECRET, 3600)
}

/// Identity with a unique id for the given role
pub fn unique_identity(role: Role) -> Identity {
    let id = uuid::Uuid::new_v4().simple().to_string();
    Identity::new(&id[..12], format!("{role}-{}@example.com", &id[..6]), role)
}

/// Valid token for an identity
pub fn token_for(identity: &Identity) -> String {
    jwt().issue(identity).expect("Failed to issue test token")
}

/// Fresh identity with the given role and a valid token for it
pub fn credentials(role: Role) -> (Identity, String) {
    let identity = unique_identity(role);
    let token = token_for(&identity);
    (identity, token)
}

/// Token that expired a minute ago
pub fn expired_token(identity: &Identity) -> String {
    jwt()
        .issue_with_ttl(identity, -60)
        .expect("Failed to issue test token")
}

/// Token signed with a different secret
pub fn foreign_token(identity: &Identity) -> String {
    JwtService::new("some-other-secret", 3600)
        .issue(identity)
        .expect("Failed to issue test token")
}
