#[cfg(test)]
mod tests {
    use super::super::{flag_value, has_flag, BackupRequest, RequiredFlag, VERBOSE_FLAGS};
    use crate::BackupError;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    fn missing_flag(args: &[&str]) -> RequiredFlag {
        match BackupRequest::from_args(&argv(args)) {
            Err(BackupError::MissingArgument { flag }) => flag,
            other => panic!("expected MissingArgument, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_short_flags() {
        let request =
            BackupRequest::from_args(&argv(&["-vm", "Backups", "-bdu", "AB12CD23", "-s2b", "Share1,Share2"]))
                .unwrap();

        assert_eq!(request.vm_name(), "Backups");
        assert_eq!(request.device_uuid(), "AB12CD23");
        assert_eq!(request.shares(), ["Share1", "Share2"]);
    }

    #[test]
    fn test_parse_long_flags_any_order() {
        let request = BackupRequest::from_args(&argv(&[
            "--shares-to-backup",
            "media",
            "--backup-device-uuid",
            "1234-ABCD",
            "--vm-name",
            "HomeAssistant",
        ]))
        .unwrap();

        assert_eq!(request.vm_name(), "HomeAssistant");
        assert_eq!(request.device_uuid(), "1234-ABCD");
        assert_eq!(request.shares(), ["media"]);
    }

    #[test]
    fn test_empty_args() {
        let result = BackupRequest::from_args(&[]);
        assert!(matches!(result, Err(BackupError::NoArguments)));
        assert_eq!(result.unwrap_err().exit_code(), 100);
    }

    #[test]
    fn test_missing_vm_name() {
        let flag = missing_flag(&["-bdu", "AB12CD23", "-s2b", "Share1"]);
        assert_eq!(flag, RequiredFlag::VmName);
        assert_eq!(flag.exit_code(), 101);
    }

    #[test]
    fn test_missing_device_uuid() {
        let flag = missing_flag(&["-vm", "Backups", "-s2b", "Share1"]);
        assert_eq!(flag, RequiredFlag::BackupDeviceUuid);
        assert_eq!(flag.exit_code(), 102);
    }

    #[test]
    fn test_missing_shares() {
        let flag = missing_flag(&["-vm", "Backups", "-bdu", "AB12CD23"]);
        assert_eq!(flag, RequiredFlag::SharesToBackup);
        assert_eq!(flag.exit_code(), 103);
    }

    #[test]
    fn test_flag_as_last_token() {
        let flag = missing_flag(&["-bdu", "AB12CD23", "-s2b", "Share1", "-vm"]);
        assert_eq!(flag, RequiredFlag::VmName);
    }

    #[test]
    fn test_empty_value_is_missing() {
        let flag = missing_flag(&["-vm", "", "-bdu", "AB12CD23", "-s2b", "Share1"]);
        assert_eq!(flag, RequiredFlag::VmName);
    }

    #[test]
    fn test_share_list_without_entries_is_missing() {
        let flag = missing_flag(&["-vm", "Backups", "-bdu", "AB12CD23", "-s2b", ",,"]);
        assert_eq!(flag, RequiredFlag::SharesToBackup);
    }

    #[test]
    fn test_share_list_drops_empty_entries() {
        let request =
            BackupRequest::from_args(&argv(&["-vm", "Backups", "-bdu", "X", "-s2b", "A,, B ,C,"]))
                .unwrap();
        assert_eq!(request.shares(), ["A", "B", "C"]);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let request = BackupRequest::from_args(&argv(&[
            "-vm", "First", "--vm-name", "Second", "-bdu", "X", "-s2b", "A",
        ]))
        .unwrap();
        assert_eq!(request.vm_name(), "First");
    }

    #[test]
    fn test_flag_value_takes_next_token_verbatim() {
        // The following token is taken even if it looks like another flag
        let args = argv(&["-vm", "-bdu", "X"]);
        assert_eq!(flag_value(&args, "--vm-name", "-vm"), Some("-bdu"));
    }

    #[test]
    fn test_unknown_tokens_ignored() {
        let request = BackupRequest::from_args(&argv(&[
            "extra", "-vm", "Backups", "--verbose", "-bdu", "X", "-s2b", "A",
        ]))
        .unwrap();
        assert_eq!(request.vm_name(), "Backups");
        assert!(has_flag(&argv(&["-v"]), VERBOSE_FLAGS));
        assert!(!has_flag(&argv(&["-vm", "x"]), VERBOSE_FLAGS));
    }

    #[test]
    fn test_flag_display() {
        assert_eq!(RequiredFlag::BackupDeviceUuid.to_string(), "--backup-device-uuid|-bdu");
    }

    #[test]
    fn test_share_outside_source_root_rejected() {
        for share in ["/", "/etc", "..", ".", "a/b", "Share1/", "../Share1"] {
            let args = argv(&["-vm", "Backups", "-bdu", "X", "-s2b", &format!("Share1,{}", share)]);
            match BackupRequest::from_args(&args) {
                Err(err @ BackupError::InvalidShare { .. }) => {
                    assert!(err.is_usage_error());
                    assert_eq!(err.exit_code(), 103, "share: {}", share);
                }
                other => panic!("share {:?}: expected InvalidShare, got {:?}", share, other),
            }
        }
    }

    #[test]
    fn test_share_with_dots_in_name_accepted() {
        let request =
            BackupRequest::from_args(&argv(&["-vm", "Backups", "-bdu", "X", "-s2b", "my.share,..hidden"]))
                .unwrap();
        assert_eq!(request.shares(), ["my.share", "..hidden"]);
    }
}
