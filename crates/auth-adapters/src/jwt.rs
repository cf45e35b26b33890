use domains::{DomainError, IdentityResolver, Result, UserId};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims issued by the account service. Older tokens carry `userId`
/// instead of `sub`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(alias = "userId")]
    pub sub: String,
    pub exp: u64,
}

/// Verifies HS256 tokens signed with a shared secret.
pub struct JwtIdentityResolver {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityResolver {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl IdentityResolver for JwtIdentityResolver {
    fn resolve(&self, credential: &str) -> Result<UserId> {
        let data = decode::<Claims>(credential.trim(), &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "jwt rejected");
            DomainError::Unauthorized("Invalid token".into())
        })?;
        let sub = data.claims.sub.trim();
        if sub.is_empty() {
            return Err(DomainError::Unauthorized("Invalid token".into()));
        }
        Ok(UserId::new(sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &[u8] = b"test-secret";

    fn in_an_hour() -> u64 {
        (chrono::Utc::now().timestamp() + 3600) as u64
    }

    fn sign(claims: &serde_json::Value, secret: &[u8]) -> String {
        encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    #[test]
    fn resolves_subject() {
        let token = sign(&serde_json::json!({ "sub": "u1", "exp": in_an_hour() }), SECRET);
        let user = JwtIdentityResolver::new(SECRET).resolve(&token).unwrap();
        assert_eq!(user.as_str(), "u1");
    }

    #[test]
    fn accepts_legacy_user_id_claim() {
        let token = sign(&serde_json::json!({ "userId": "u2", "exp": in_an_hour() }), SECRET);
        let user = JwtIdentityResolver::new(SECRET).resolve(&token).unwrap();
        assert_eq!(user.as_str(), "u2");
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let resolver = JwtIdentityResolver::new(SECRET);

        let forged = sign(&serde_json::json!({ "sub": "u1", "exp": in_an_hour() }), b"other");
        assert!(matches!(resolver.resolve(&forged), Err(DomainError::Unauthorized(_))));

        let expired = sign(&serde_json::json!({ "sub": "u1", "exp": 1_000 }), SECRET);
        assert!(matches!(resolver.resolve(&expired), Err(DomainError::Unauthorized(_))));

        assert!(resolver.resolve("not-a-jwt").is_err());
    }
}
