use sha2::{Digest, Sha256};

use crate::config::ChainConfig;

/// Which on-chain registry a digest anchors into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttestationKind {
    Kyc,
    Kyb,
    ProjectRegistry,
}

impl AttestationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttestationKind::Kyc => "kyc",
            AttestationKind::Kyb => "kyb",
            AttestationKind::ProjectRegistry => "project-registry",
        }
    }
}

/// SHA-256 over the canonical encoding of an attestation payload, rendered
/// as 0x-prefixed hex. serde_json serializes object keys in sorted order,
/// which is what makes the encoding canonical.
pub fn attestation_digest(
    kind: AttestationKind,
    subject_id: &str,
    payload: &serde_json::Value,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update(b"\x1f");
    hasher.update(subject_id.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(payload.to_string().as_bytes());

    let digest = hasher.finalize();
    let mut out = String::with_capacity(2 + 64);
    out.push_str("0x");
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// Contract addresses for the platform's BNB Smart Chain registries. The
/// contract calls themselves happen outside this service; we only produce
/// the digests and know where they are anchored.
pub struct ChainRegistry {
    config: ChainConfig,
}

impl ChainRegistry {
    pub fn new(config: ChainConfig) -> Self {
        Self { config }
    }

    pub fn contract_address(&self, kind: AttestationKind) -> Option<&str> {
        let address = match kind {
            AttestationKind::Kyc => &self.config.kyc_contract_address,
            AttestationKind::Kyb => &self.config.kyb_contract_address,
            AttestationKind::ProjectRegistry => &self.config.project_registry_address,
        };
        if address.is_empty() {
            None
        } else {
            Some(address)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn digest_is_stable_and_well_formed() {
        let payload = json!({ "name": "Nebula", "symbol": "NEB" });
        let a = attestation_digest(AttestationKind::ProjectRegistry, "p1", &payload);
        let b = attestation_digest(AttestationKind::ProjectRegistry, "p1", &payload);

        assert_eq!(a, b);
        assert!(a.starts_with("0x"));
        assert_eq!(a.len(), 66);
        assert!(a[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn digest_depends_on_kind_subject_and_payload() {
        let payload = json!({ "name": "Nebula" });
        let base = attestation_digest(AttestationKind::Kyc, "u1", &payload);

        assert_ne!(
            base,
            attestation_digest(AttestationKind::Kyb, "u1", &payload)
        );
        assert_ne!(
            base,
            attestation_digest(AttestationKind::Kyc, "u2", &payload)
        );
        assert_ne!(
            base,
            attestation_digest(AttestationKind::Kyc, "u1", &json!({ "name": "Vega" }))
        );
    }

    #[test]
    fn empty_addresses_read_as_unconfigured() {
        let registry = ChainRegistry::new(ChainConfig::default());
        assert!(registry.contract_address(AttestationKind::Kyc).is_none());

        let registry = ChainRegistry::new(ChainConfig {
            kyc_contract_address: "0xabc".to_string(),
            ..ChainConfig::default()
        });
        assert_eq!(
            registry.contract_address(AttestationKind::Kyc),
            Some("0xabc")
        );
    }
}
