use std::{fs, os::unix::fs::PermissionsExt, path::PathBuf};

use bouncer_fixtures::{config::WaitConfig, HarnessConfig};
use tempfile::TempDir;

/// Stand-in for a bouncer: echoes its config, spawns one child and waits for it.
const FAKE_BOUNCER: &str = r#"#!/bin/sh
echo "config: $2"
cat "$2"
if [ -f "$2.local" ]; then
    echo "local config found"
    cat "$2.local"
fi
echo "starting proxy"
sleep 30 &
echo "proxy started"
echo "warning: running without a lapi" >&2
wait
echo "proxy stopped"
"#;

/// A bouncer that gives up right after starting.
const CRASHING_BOUNCER: &str = r#"#!/bin/sh
echo "fatal: no api key" >&2
exit 1
"#;

pub const BOUNCER_UNDER_TEST: &str = "bin/fake-bouncer";
pub const CRASHING_BOUNCER_UNDER_TEST: &str = "bin/crashing-bouncer";

// The repository owns the fake bouncer, so it must outlive every launched process.
pub struct FakeRepo {
    dir: TempDir,
}

impl FakeRepo {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        fs::create_dir(dir.path().join(".git"))?;
        fs::create_dir(dir.path().join("bin"))?;

        for (name, script) in [
            (BOUNCER_UNDER_TEST, FAKE_BOUNCER),
            (CRASHING_BOUNCER_UNDER_TEST, CRASHING_BOUNCER),
        ] {
            let binary = dir.path().join(name);
            fs::write(&binary, script)?;
            fs::set_permissions(&binary, fs::Permissions::from_mode(0o755))?;
        }

        Ok(Self { dir })
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn harness_config(&self) -> HarnessConfig {
        HarnessConfig {
            bouncer_under_test: Some(PathBuf::from(BOUNCER_UNDER_TEST)),
            wait: WaitConfig::default(),
            ..Default::default()
        }
    }
}
