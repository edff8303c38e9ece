//! Integration tests for the `pairctl` binary.
//!
//! Every test points the binary at a temporary bus snapshot so no real
//! hardware is touched.

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use assert_cmd::cargo::cargo_bin_cmd;
    use predicates::prelude::*;
    use std::fs;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SNAPSHOT: &str = r#"
    {
        "receivers": [
            {
                "path": "/dev/hidraw0",
                "name": "Unifying Receiver",
                "serial": "4F2A1B3C",
                "paired": [
                    {"slot": 1, "name": "Wireless Mouse M185", "serial": "1A2B3C4D", "codename": "M185", "kind": "mouse"},
                    {"slot": 4, "name": "Wireless Keyboard K270", "serial": "5E6F7A8B", "codename": "K270", "kind": "keyboard"}
                ]
            }
        ],
        "devices": [
            {"path": "/dev/hidraw3", "name": "G502 Wired Mouse", "serial": "99887766", "codename": "G502", "kind": "mouse"}
        ]
    }
    "#;

    fn write_snapshot(content: &str) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        write!(file, "{content}")?;
        Ok(file)
    }

    fn pairctl_cmd(snapshot: &NamedTempFile) -> assert_cmd::Command {
        let mut cmd = cargo_bin_cmd!("pairctl");
        cmd.env_remove("RUST_LOG")
            .env_remove("PAIRCTL_SNAPSHOT")
            .arg("--snapshot")
            .arg(snapshot.path());
        cmd
    }

    #[test]
    fn no_action_prints_usage() -> Result<()> {
        let snapshot = write_snapshot(SNAPSHOT)?;
        pairctl_cmd(&snapshot)
            .assert()
            .code(2)
            .stderr(
                predicate::str::contains("Usage")
                    .and(predicate::str::contains("pairctl: error: too few arguments")),
            );
        Ok(())
    }

    #[test]
    fn show_mouse_lists_every_mouse() -> Result<()> {
        let snapshot = write_snapshot(SNAPSHOT)?;
        pairctl_cmd(&snapshot)
            .args(["show", "mouse"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("Wireless Mouse M185")
                    .and(predicate::str::contains("G502 Wired Mouse"))
                    .and(predicate::str::contains("K270").not()),
            );
        Ok(())
    }

    #[test]
    fn unknown_device_fails() -> Result<()> {
        let snapshot = write_snapshot(SNAPSHOT)?;
        pairctl_cmd(&snapshot)
            .args(["show", "trackball"])
            .assert()
            .code(1)
            .stderr(predicate::str::starts_with(
                "pairctl: error: no device found matching 'trackball'",
            ));
        Ok(())
    }

    #[test]
    fn empty_bus_reports_no_devices() -> Result<()> {
        let snapshot = write_snapshot(r#"{"receivers": [], "devices": []}"#)?;
        pairctl_cmd(&snapshot)
            .arg("show")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("No supported device found"));
        Ok(())
    }

    #[test]
    fn missing_snapshot_fails() -> Result<()> {
        let snapshot = write_snapshot(SNAPSHOT)?;
        let path = snapshot.path().to_path_buf();
        drop(snapshot);

        cargo_bin_cmd!("pairctl")
            .env_remove("PAIRCTL_SNAPSHOT")
            .arg("--snapshot")
            .arg(&path)
            .arg("show")
            .assert()
            .code(1)
            .stderr(predicate::str::contains(
                "pairctl: error: failed to enumerate hardware",
            ));
        Ok(())
    }

    #[test]
    fn slotless_paired_device_is_rejected() -> Result<()> {
        let snapshot = write_snapshot(
            r#"{"receivers": [{"path": "/dev/hidraw0", "name": "Unifying Receiver", "paired": [{"name": "Mouse", "serial": "1"}]}]}"#,
        )?;
        pairctl_cmd(&snapshot)
            .arg("show")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("paired device Mouse has no slot"));
        Ok(())
    }

    #[test]
    fn construction_failure_is_fatal() -> Result<()> {
        let snapshot = write_snapshot(
            r#"{"receivers": [{"path": "/dev/hidraw0", "name": "Unifying Receiver", "error": "Permission denied"}]}"#,
        )?;
        pairctl_cmd(&snapshot)
            .arg("probe")
            .assert()
            .code(1)
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("pairctl: error: Permission denied"));
        Ok(())
    }

    // Unpairing is written back to the snapshot file
    #[test]
    fn unpair_updates_snapshot() -> Result<()> {
        let snapshot = write_snapshot(SNAPSHOT)?;
        pairctl_cmd(&snapshot)
            .args(["unpair", "4"])
            .assert()
            .success()
            .stdout("Unpaired 4: Wireless Keyboard K270 (K270) [5E6F7A8B]\n");

        let content = fs::read_to_string(snapshot.path())?;
        assert!(content.contains("Wireless Mouse M185"));
        assert!(!content.contains("Wireless Keyboard K270"));

        pairctl_cmd(&snapshot)
            .args(["unpair", "4"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("no device found matching '4'"));
        Ok(())
    }
}
