//! Signing identity using Ed25519
//!
//! Key material lives on disk as the raw 32-byte signing seed. The
//! signature travels in a Message's `signature` field as lowercase hex;
//! the helpers here produce and check that encoding.

use std::fs;
use std::path::Path;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use tracing::info;

use rumor_core::{RumorError, RumorResult};

/// Size of a signing-key seed file in bytes
pub const KEY_FILE_LEN: usize = 32;

/// Signing identity for a node
#[derive(Clone)]
pub struct Identity {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Identity {
    /// Generate a new random identity
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        Identity {
            signing_key,
            verifying_key,
        }
    }

    /// Rebuild an identity from signing-key bytes
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(bytes);
        let verifying_key = signing_key.verifying_key();
        Identity {
            signing_key,
            verifying_key,
        }
    }

    /// Load the signing key from a raw seed file
    pub fn load_key(path: impl AsRef<Path>) -> RumorResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| RumorError::KeyStorage(format!("read {}: {e}", path.display())))?;
        let seed: [u8; KEY_FILE_LEN] = bytes.as_slice().try_into().map_err(|_| {
            RumorError::KeyStorage(format!(
                "{}: expected {KEY_FILE_LEN} bytes, found {}",
                path.display(),
                bytes.len()
            ))
        })?;
        info!(path = %path.display(), "loaded signing key");
        Ok(Identity::from_bytes(&seed))
    }

    /// Persist the signing key as a raw seed file
    pub fn save_key(&self, path: impl AsRef<Path>) -> RumorResult<()> {
        let path = path.as_ref();
        fs::write(path, self.signing_key.to_bytes())
            .map_err(|e| RumorError::KeyStorage(format!("write {}: {e}", path.display())))?;
        info!(path = %path.display(), "saved signing key");
        Ok(())
    }

    /// Get the signing key bytes (secret)
    pub fn signing_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Get the verifying key bytes (public)
    pub fn verifying_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Sign a payload
    pub fn sign(&self, payload: &[u8]) -> [u8; 64] {
        self.signing_key.sign(payload).to_bytes()
    }

    /// Sign a payload, hex-encoded for a Message's signature field
    pub fn sign_hex(&self, payload: &[u8]) -> String {
        hex::encode(self.sign(payload))
    }

    /// Verify a signature made with this identity's key
    pub fn verify(&self, payload: &[u8], signature: &[u8; 64]) -> bool {
        let sig = Signature::from_bytes(signature);
        self.verifying_key.verify(payload, &sig).is_ok()
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("verifying_key", &hex::encode(self.verifying_key.as_bytes()))
            .finish_non_exhaustive()
    }
}

/// Verification-only identity
#[derive(Clone)]
pub struct PublicIdentity {
    verifying_key: VerifyingKey,
}

impl PublicIdentity {
    /// Create from verifying key bytes
    pub fn from_bytes(bytes: &[u8; 32]) -> Option<Self> {
        let verifying_key = VerifyingKey::from_bytes(bytes).ok()?;
        Some(PublicIdentity { verifying_key })
    }

    /// Get the verifying key bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Verify a signature
    pub fn verify(&self, payload: &[u8], signature: &[u8; 64]) -> bool {
        let sig = Signature::from_bytes(signature);
        self.verifying_key.verify(payload, &sig).is_ok()
    }

    /// Verify a hex signature from a Message's signature field
    pub fn verify_hex(&self, payload: &[u8], signature_hex: &str) -> bool {
        let bytes = match hex::decode(signature_hex) {
            Ok(b) => b,
            Err(_) => return false,
        };
        let signature: [u8; 64] = match bytes.as_slice().try_into() {
            Ok(s) => s,
            Err(_) => return false,
        };
        self.verify(payload, &signature)
    }
}

impl std::fmt::Debug for PublicIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicIdentity")
            .field("verifying_key", &hex::encode(self.verifying_key.as_bytes()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify() {
        let identity = Identity::generate();
        let payload = b"a meme for the mesh";

        let signature = identity.sign(payload);
        assert!(identity.verify(payload, &signature));
        assert!(!identity.verify(b"a different meme", &signature));
    }

    #[test]
    fn test_distinct_identities() {
        let a = Identity::generate();
        let b = Identity::generate();
        assert_ne!(a.verifying_key_bytes(), b.verifying_key_bytes());
    }

    #[test]
    fn test_public_identity_verifies() {
        let identity = Identity::generate();
        let public = PublicIdentity::from_bytes(&identity.verifying_key_bytes()).unwrap();

        let payload = b"signed at the edge";
        let signature = identity.sign(payload);
        assert!(public.verify(payload, &signature));
    }

    #[test]
    fn test_hex_signature_field() {
        let identity = Identity::generate();
        let public = PublicIdentity::from_bytes(&identity.verifying_key_bytes()).unwrap();

        let sig = identity.sign_hex(b"content");
        assert_eq!(sig.len(), 128);
        assert!(public.verify_hex(b"content", &sig));
        assert!(!public.verify_hex(b"tampered", &sig));
        assert!(!public.verify_hex(b"content", "zz"));
    }

    #[test]
    fn test_key_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.key");

        let identity = Identity::generate();
        identity.save_key(&path).unwrap();
        let restored = Identity::load_key(&path).unwrap();

        assert_eq!(identity.signing_key_bytes(), restored.signing_key_bytes());
        let signature = restored.sign(b"still me");
        assert!(identity.verify(b"still me", &signature));
    }

    #[test]
    fn test_key_file_wrong_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.key");
        std::fs::write(&path, [0u8; 7]).unwrap();

        let result = Identity::load_key(&path);
        assert!(matches!(result, Err(RumorError::KeyStorage(_))));
    }

    #[test]
    fn test_key_file_missing() {
        let result = Identity::load_key("/nonexistent/nowhere.key");
        assert!(matches!(result, Err(RumorError::KeyStorage(_))));
    }
}
