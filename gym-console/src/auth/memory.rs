//! In-process credential provider
//!
//! Secrets are kept as argon2 hashes keyed by lower-cased email.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use validator::ValidateEmail;

use super::provider::{AuthError, AuthResult, CredentialProvider, Session, SessionEvent};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
struct StoredCredential {
    uid: String,
    email: String,
    hash: String,
}

/// Hash a secret using argon2
fn hash_secret(secret: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(secret.as_bytes(), &salt)?
        .to_string())
}

/// Verify a secret using argon2
fn verify_secret(secret: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok())
}

/// In-memory [`CredentialProvider`]
pub struct MemoryCredentialProvider {
    credentials: DashMap<String, StoredCredential>,
    min_secret_len: usize,
    events: broadcast::Sender<SessionEvent>,
    outage: Mutex<Option<String>>,
}

impl MemoryCredentialProvider {
    pub fn new(min_secret_len: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            credentials: DashMap::new(),
            min_secret_len,
            events,
            outage: Mutex::new(None),
        }
    }

    /// Make every call fail with a provider error (None clears)
    pub fn set_outage(&self, message: Option<&str>) {
        *self.outage.lock() = message.map(str::to_string);
    }

    /// Number of credentials held
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    fn check_outage(&self) -> AuthResult<()> {
        match self.outage.lock().as_ref() {
            Some(msg) => Err(AuthError::Provider(msg.clone())),
            None => Ok(()),
        }
    }

    fn session_for(credential: &StoredCredential) -> Session {
        Session {
            uid: credential.uid.clone(),
            email: credential.email.clone(),
            signed_in_at: shared::util::now(),
        }
    }
}

fn normalize(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

#[async_trait]
impl CredentialProvider for MemoryCredentialProvider {
    async fn sign_in(&self, identifier: &str, secret: &str) -> AuthResult<Session> {
        self.check_outage()?;
        let credential = self
            .credentials
            .get(&normalize(identifier))
            .map(|c| c.value().clone())
            .ok_or(AuthError::InvalidCredentials)?;

        let valid = verify_secret(secret, &credential.hash)
            .map_err(|e| AuthError::Provider(format!("Password verification failed: {e}")))?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        let session = Self::session_for(&credential);
        let _ = self.events.send(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn create_credential(&self, identifier: &str, secret: &str) -> AuthResult<Session> {
        self.check_outage()?;
        let email = normalize(identifier);
        if !email.validate_email() {
            return Err(AuthError::InvalidIdentifier(identifier.trim().to_string()));
        }
        if secret.chars().count() < self.min_secret_len {
            return Err(AuthError::WeakSecret(self.min_secret_len));
        }

        let hash = hash_secret(secret)
            .map_err(|e| AuthError::Provider(format!("Password hashing failed: {e}")))?;

        match self.credentials.entry(email.clone()) {
            Entry::Occupied(_) => Err(AuthError::AlreadyExists(email)),
            Entry::Vacant(slot) => {
                let credential = StoredCredential {
                    uid: uuid::Uuid::new_v4().to_string(),
                    email,
                    hash,
                };
                let session = Self::session_for(&credential);
                slot.insert(credential);
                Ok(session)
            }
        }
    }

    async fn sign_out(&self, session: &Session) -> AuthResult<()> {
        self.check_outage()?;
        let _ = self.events.send(SessionEvent::SignedOut {
            uid: session.uid.clone(),
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_sign_in() {
        let provider = MemoryCredentialProvider::new(6);
        let created = provider
            .create_credential("Owner@Gym.test", "secret1")
            .await
            .unwrap();
        assert_eq!(created.email, "owner@gym.test");

        let session = provider.sign_in(" owner@gym.test ", "secret1").await.unwrap();
        assert_eq!(session.uid, created.uid);
    }

    #[tokio::test]
    async fn test_sign_in_failures_are_indistinguishable() {
        let provider = MemoryCredentialProvider::new(6);
        provider.create_credential("owner@gym.test", "secret1").await.unwrap();

        let wrong = provider.sign_in("owner@gym.test", "nope").await.unwrap_err();
        let unknown = provider.sign_in("ghost@gym.test", "secret1").await.unwrap_err();
        assert_eq!(wrong, AuthError::InvalidCredentials);
        assert_eq!(unknown, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_create_credential_rules() {
        let provider = MemoryCredentialProvider::new(6);
        assert_eq!(
            provider.create_credential("a@gym.test", "123").await.unwrap_err(),
            AuthError::WeakSecret(6)
        );
        assert!(matches!(
            provider.create_credential("admin", "secret1").await.unwrap_err(),
            AuthError::InvalidIdentifier(_)
        ));
        provider.create_credential("a@gym.test", "secret1").await.unwrap();
        assert!(matches!(
            provider.create_credential("A@gym.test", "secret2").await.unwrap_err(),
            AuthError::AlreadyExists(_)
        ));
        assert_eq!(provider.len(), 1);
    }

    #[tokio::test]
    async fn test_session_events() {
        let provider = MemoryCredentialProvider::new(6);
        let mut events = provider.subscribe();
        provider.create_credential("a@gym.test", "secret1").await.unwrap();
        let session = provider.sign_in("a@gym.test", "secret1").await.unwrap();
        provider.sign_out(&session).await.unwrap();

        assert_eq!(events.recv().await.unwrap(), SessionEvent::SignedIn(session.clone()));
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::SignedOut { uid: session.uid }
        );
    }

    #[tokio::test]
    async fn test_outage() {
        let provider = MemoryCredentialProvider::new(6);
        provider.set_outage(Some("unavailable"));
        assert!(matches!(
            provider.sign_in("a@gym.test", "secret1").await.unwrap_err(),
            AuthError::Provider(_)
        ));
    }
}
