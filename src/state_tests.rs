// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `state.rs`

#[cfg(test)]
mod tests {
    use crate::records::RecordState;
    use crate::state::{StateFile, STATE_VERSION};
    use crate::zones::ZoneState;

    fn zone_state() -> ZoneState {
        ZoneState {
            id: "example.com".into(),
            zone: "example.com".into(),
            contract_id: "C-1".into(),
            zone_type: "PRIMARY".into(),
            sign_and_serve: false,
            comment: "Managed by automation".into(),
            activation_state: Some("ACTIVE".into()),
        }
    }

    fn record_state() -> RecordState {
        RecordState {
            id: "example.com|www.example.com|A".into(),
            zone: "example.com".into(),
            name: "www".into(),
            fqdn: "www.example.com".into(),
            record_type: "A".into(),
            ttl: 300,
            rdata: vec!["192.0.2.1".into()],
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateFile::load(&dir.path().join("state.json")).await.unwrap();
        assert!(state.is_empty());
        assert_eq!(state.version, STATE_VERSION);
        assert_eq!(state.serial, 0);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut state = StateFile::default();
        state.zones.insert("example.com".into(), zone_state());
        state
            .records
            .insert("example.com|www.example.com|A".into(), record_state());
        state.save(&path).await.unwrap();
        state.save(&path).await.unwrap();

        let loaded = StateFile::load(&path).await.unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.serial, 2);
        assert!(loaded.updated_at.is_some());
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_state_json_shape() {
        let mut state = StateFile::default();
        state
            .records
            .insert("web".into(), record_state());
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["records"]["web"]["id"], "example.com|www.example.com|A");
        assert_eq!(json["records"]["web"]["type"], "A");
    }

    #[tokio::test]
    async fn test_newer_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, r#"{"version": 99, "serial": 1}"#)
            .await
            .unwrap();
        assert!(StateFile::load(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, "not json").await.unwrap();
        assert!(StateFile::load(&path).await.is_err());
    }
}
