// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `apply.rs`

#[cfg(test)]
mod tests {
    use crate::api::fake::{FakeDnsApi, Reply};
    use crate::apply::{apply, destroy, refresh, Action, ApplyOptions};
    use crate::manifest::Manifest;
    use crate::poller::PollConfig;
    use crate::state::StateFile;
    use std::time::Duration;

    const MANIFEST: &str = r#"
zones:
  - zone: example.com
    contractId: C-1
records:
  - zone: example.com
    name: www
    type: A
    ttl: 300
    rdata: ["192.0.2.1"]
  - key: spf
    zone: example.com
    type: TXT
    ttl: 3600
    rdata: ["v=spf1 -all"]
  - zone: example.com
    name: alias
    type: CNAME
    ttl: 300
    rdata: ["www.example.com."]
"#;

    fn options() -> ApplyOptions {
        ApplyOptions {
            poll: PollConfig::new(Duration::from_secs(30), Duration::from_secs(1)),
            ..ApplyOptions::default()
        }
    }

    #[tokio::test]
    async fn test_first_apply_creates_everything() {
        let api = FakeDnsApi::new();
        let manifest = Manifest::from_yaml(MANIFEST).unwrap();
        let mut state = StateFile::default();

        let report = apply(&api, &manifest, &mut state, &options()).await;

        assert!(report.is_success(), "{:?}", report.failures);
        assert_eq!(report.count(Action::Created), 4);
        assert!(state.zones.contains_key("example.com"));
        assert_eq!(state.records.len(), 3);
        assert!(state.records.contains_key("spf"));
        assert!(state.records.contains_key("example.com|www.example.com|A"));
        assert_eq!(api.record_count(), 3);
    }

    #[tokio::test]
    async fn test_second_apply_is_a_no_op() {
        let api = FakeDnsApi::new();
        let manifest = Manifest::from_yaml(MANIFEST).unwrap();
        let mut state = StateFile::default();
        apply(&api, &manifest, &mut state, &options()).await;
        let before = state.clone();

        let report = apply(&api, &manifest, &mut state, &options()).await;

        assert!(report.is_success());
        assert_eq!(report.count(Action::Unchanged), 4);
        assert_eq!(api.calls_to("update_record_set"), 0);
        assert_eq!(api.calls_to("update_zone"), 0);
        assert_eq!(state.records, before.records);
    }

    #[tokio::test]
    async fn test_ttl_change_updates_in_place() {
        let api = FakeDnsApi::new();
        let mut state = StateFile::default();
        apply(&api, &Manifest::from_yaml(MANIFEST).unwrap(), &mut state, &options()).await;

        let changed = MANIFEST.replace("ttl: 3600", "ttl: 60");
        let report = apply(&api, &Manifest::from_yaml(&changed).unwrap(), &mut state, &options()).await;

        assert_eq!(report.count(Action::Updated), 1);
        assert_eq!(api.calls_to("update_record_set"), 1);
        assert_eq!(state.records["spf"].ttl, 60);
    }

    #[tokio::test]
    async fn test_keyed_type_change_replaces_record() {
        let api = FakeDnsApi::new();
        let mut state = StateFile::default();
        apply(&api, &Manifest::from_yaml(MANIFEST).unwrap(), &mut state, &options()).await;

        let changed = MANIFEST.replace("type: TXT", "type: SPF");
        let report = apply(&api, &Manifest::from_yaml(&changed).unwrap(), &mut state, &options()).await;

        assert!(report.is_success(), "{:?}", report.failures);
        assert_eq!(api.calls_to("update_record_set"), 0);
        assert_eq!(state.records["spf"].id, "example.com|example.com|SPF");
        assert!(api.record("example.com", "example.com", "TXT").is_none());
        assert!(api.record("example.com", "example.com", "SPF").is_some());
    }

    #[tokio::test]
    async fn test_removed_entry_is_deleted() {
        let api = FakeDnsApi::new();
        let mut state = StateFile::default();
        apply(&api, &Manifest::from_yaml(MANIFEST).unwrap(), &mut state, &options()).await;

        let mut manifest = Manifest::from_yaml(MANIFEST).unwrap();
        manifest.records.retain(|r| r.key.is_some());
        let report = apply(&api, &manifest, &mut state, &options()).await;

        assert_eq!(report.count(Action::Deleted), 2);
        assert_eq!(state.records.len(), 1);
        assert_eq!(api.record_count(), 1);
    }

    #[tokio::test]
    async fn test_record_deleted_out_of_band_is_recreated() {
        let api = FakeDnsApi::new();
        let manifest = Manifest::from_yaml(MANIFEST).unwrap();
        let mut state = StateFile::default();
        apply(&api, &manifest, &mut state, &options()).await;

        api.script("get_record_set", &[Reply::Error(404)]);
        let report = apply(&api, &manifest, &mut state, &options()).await;

        assert!(report.is_success());
        assert_eq!(report.count(Action::Created), 1);
    }

    #[tokio::test]
    async fn test_failure_is_reported_and_others_proceed() {
        let api = FakeDnsApi::new();
        let manifest = Manifest::from_yaml(MANIFEST).unwrap();
        let mut state = StateFile::default();
        api.script("create_record_set", &[Reply::Error(400)]);

        let report = apply(&api, &manifest, &mut state, &options()).await;

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].error.status_reason(), "RecordCreationFailed");
        assert_eq!(state.records.len(), 2);
    }

    #[tokio::test]
    async fn test_destroy_removes_records_then_zone() {
        let api = FakeDnsApi::new();
        let mut state = StateFile::default();
        apply(&api, &Manifest::from_yaml(MANIFEST).unwrap(), &mut state, &options()).await;

        let report = destroy(&api, &mut state, &options()).await;

        assert!(report.is_success(), "{:?}", report.failures);
        assert!(state.is_empty());
        assert!(api.zone("example.com").is_none());

        let calls = api.calls();
        let last_record_delete = calls
            .iter()
            .rposition(|c| c.method == "delete_record_set")
            .unwrap();
        let zone_delete = calls.iter().position(|c| c.method == "delete_zone").unwrap();
        assert!(last_record_delete < zone_delete);
    }

    #[tokio::test]
    async fn test_refresh_drops_absent_resources() {
        let api = FakeDnsApi::new();
        let mut state = StateFile::default();
        apply(&api, &Manifest::from_yaml(MANIFEST).unwrap(), &mut state, &options()).await;

        api.script("get_record_set", &[Reply::Error(404)]);
        let report = refresh(&api, &mut state).await;

        assert!(report.is_success());
        assert_eq!(report.count(Action::Dropped), 1);
        assert_eq!(state.records.len(), 2);
        assert!(state.zones.contains_key("example.com"));
    }
}
