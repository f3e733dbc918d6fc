//! Overlay registrar: durable knowledge-base markers for hospitals/payers.
//!
//! Each entry is an idempotent upsert keyed by the deterministic id from
//! [`crate::ids`] — a `.keep` marker plus a `meta.json` descriptor under the
//! entity's prefix. Content is a pure function of the inputs, so repeated or
//! concurrent registration of the same entity converges on identical state.

use serde::Serialize;

use crate::ids;
use crate::storage::{KbStore, StorageError};

#[derive(Debug, Serialize)]
struct HospitalEntry<'a> {
    hospital_id: &'a str,
    provider_name: &'a str,
    state: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PayerEntry<'a> {
    payer_id: &'a str,
    payer_name: &'a str,
    plan_name: Option<&'a str>,
}

pub struct OverlayRegistrar {
    store: Box<dyn KbStore + Send + Sync>,
}

impl OverlayRegistrar {
    pub fn new(store: Box<dyn KbStore + Send + Sync>) -> Self {
        Self { store }
    }

    pub fn ensure_hospital_overlay(
        &self,
        provider_name: &str,
        state: Option<&str>,
    ) -> Result<String, StorageError> {
        let hid = ids::hospital_id(provider_name, state);
        let canonical = ids::canonical_hospital_name(provider_name);
        let prefix = format!("10_dynamic_inputs/hospitals/{hid}/");
        // Descriptor content is a function of the resolved identity, not the
        // raw spelling, so alias variants upsert byte-identical entries.
        let entry = HospitalEntry {
            hospital_id: &hid,
            provider_name: &canonical,
            state,
        };
        self.put_entry(&prefix, &entry)?;
        Ok(hid)
    }

    pub fn ensure_payer_overlay(
        &self,
        payer_name: &str,
        plan_name: Option<&str>,
    ) -> Result<Option<String>, StorageError> {
        let Some(pid) = ids::payer_id(Some(payer_name), plan_name) else {
            return Ok(None);
        };
        let canonical = ids::canonical_payer_name(payer_name);
        let prefix = format!("10_dynamic_inputs/payers/{pid}/");
        let entry = PayerEntry {
            payer_id: &pid,
            payer_name: &canonical,
            plan_name,
        };
        self.put_entry(&prefix, &entry)?;
        Ok(Some(pid))
    }

    fn put_entry<T: Serialize>(&self, prefix: &str, entry: &T) -> Result<(), StorageError> {
        self.store
            .put_text(&format!("{prefix}.keep"), "", "text/plain; charset=utf-8")?;
        let body = serde_json::to_string_pretty(entry)?;
        self.store.put_text(
            &format!("{prefix}meta.json"),
            &body,
            "application/json; charset=utf-8",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FailingKbStore, MemoryKbStore};
    use std::sync::Arc;

    #[test]
    fn hospital_overlay_writes_marker_and_descriptor() {
        let store = Arc::new(MemoryKbStore::new());
        let registrar = OverlayRegistrar::new(Box::new(SharedKb(store.clone())));

        let hid = registrar
            .ensure_hospital_overlay("Froedtert Memorial Lutheran Hospital", Some("WI"))
            .unwrap();

        assert_eq!(hid, "wi_froedtert_hospital");
        assert!(store
            .object("10_dynamic_inputs/hospitals/wi_froedtert_hospital/.keep")
            .is_some());
        let meta = store
            .object("10_dynamic_inputs/hospitals/wi_froedtert_hospital/meta.json")
            .unwrap();
        assert!(meta.contains("\"hospital_id\": \"wi_froedtert_hospital\""));
        // Descriptor carries the canonical display name, not the raw variant.
        assert!(meta.contains("\"provider_name\": \"Froedtert Hospital\""));
    }

    #[test]
    fn repeated_registration_is_idempotent() {
        let store = Arc::new(MemoryKbStore::new());
        let registrar = OverlayRegistrar::new(Box::new(SharedKb(store.clone())));

        let first = registrar
            .ensure_payer_overlay("UHC", Some("Choice Plus"))
            .unwrap();
        let second = registrar
            .ensure_payer_overlay("United Healthcare", Some("Choice Plus"))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.as_deref(),
            Some("unitedhealthcare_choice_plus")
        );
        // Alias variants converge on one entry: marker + descriptor only.
        assert_eq!(store.object_count(), 2);
    }

    #[test]
    fn store_failure_propagates_to_caller() {
        let registrar = OverlayRegistrar::new(Box::new(FailingKbStore));
        assert!(registrar
            .ensure_hospital_overlay("Cedar Clinic", None)
            .is_err());
    }

    /// Arc adapter so tests can inspect the store after handing it to the
    /// registrar.
    struct SharedKb(Arc<MemoryKbStore>);

    impl KbStore for SharedKb {
        fn put_text(
            &self,
            path: &str,
            text: &str,
            content_type: &str,
        ) -> Result<(), StorageError> {
            self.0.put_text(path, text, content_type)
        }
    }
}
