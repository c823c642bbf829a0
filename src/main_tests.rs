// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `main.rs`

#[cfg(test)]
mod tests {
    use super::super::{Cli, Command};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_apply_arguments() {
        let cli = Cli::try_parse_from([
            "zonekeeper",
            "--api-url",
            "https://dns.example.net",
            "apply",
            "--manifest",
            "zones.yaml",
            "--poll-timeout-secs",
            "60",
        ])
        .unwrap();

        assert_eq!(cli.global.api_url.as_deref(), Some("https://dns.example.net"));
        assert_eq!(cli.global.poll_timeout_secs, Some(60));
        let Command::Apply {
            manifest,
            state,
            force_zone_delete,
            concurrency,
        } = cli.command
        else {
            panic!("expected apply");
        };
        assert_eq!(manifest, PathBuf::from("zones.yaml"));
        assert_eq!(state, PathBuf::from("zonekeeper.state.json"));
        assert!(!force_zone_delete);
        assert_eq!(concurrency, 8);
    }

    #[test]
    fn test_import_record_key_requires_state() {
        let err = Cli::try_parse_from([
            "zonekeeper",
            "import-record",
            "example.com|www.example.com|A",
            "--key",
            "web",
        ]);
        assert!(err.is_err());

        let cli = Cli::try_parse_from([
            "zonekeeper",
            "import-record",
            "example.com|www.example.com|A",
            "--state",
            "s.json",
            "--key",
            "web",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::ImportRecord { key: Some(_), .. }));
    }

    #[test]
    fn test_show_zone_and_print_metrics() {
        let cli = Cli::try_parse_from(["zonekeeper", "show-zone", "example.com", "--print-metrics"])
            .unwrap();
        assert!(cli.global.print_metrics);
        assert!(matches!(cli.command, Command::ShowZone { ref zone } if zone == "example.com"));
    }
}
