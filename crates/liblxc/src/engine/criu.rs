use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use super::freezer::{Freezer, FreezerState};
use super::{RestartFlags, RestoreEngine, RestoreError};
use crate::config::LxcConf;

const CRIU_RESTORE_LOG_FILE: &str = "restore.log";
const DEFAULT_CGROUP_ROOT: &str = "/sys/fs/cgroup";
const LXC_CGROUP_PARENT: &str = "lxc";

/// Restores containers with CRIU
#[derive(Debug, Clone)]
pub struct CriuEngine {
    cgroup_root: PathBuf,
}

impl Default for CriuEngine {
    fn default() -> Self {
        Self {
            cgroup_root: PathBuf::from(DEFAULT_CGROUP_ROOT),
        }
    }
}

impl CriuEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cgroup_root<P: Into<PathBuf>>(mut self, cgroup_root: P) -> Self {
        self.cgroup_root = cgroup_root.into();
        self
    }

    /// cgroup the container processes are restored into
    pub fn container_cgroup(&self, name: &str) -> PathBuf {
        self.cgroup_root.join(LXC_CGROUP_PARENT).join(name)
    }

    // Runs once CRIU has handed the process tree back.
    fn after_restore(&self, name: &str, flags: RestartFlags) -> Result<(), RestoreError> {
        if !flags.contains(RestartFlags::PAUSE) {
            return Ok(());
        }

        let cgroup = self.container_cgroup(name);
        tracing::debug!(?cgroup, "leaving container {} paused", name);
        Freezer::default().apply(FreezerState::Frozen, &cgroup)?;
        Ok(())
    }
}

impl RestoreEngine for CriuEngine {
    fn restore(
        &self,
        name: &str,
        statefile: &Path,
        conf: &LxcConf,
        flags: RestartFlags,
    ) -> Result<(), RestoreError> {
        let images = File::open(statefile).map_err(|source| RestoreError::StateFile {
            path: statefile.to_path_buf(),
            source,
        })?;

        let mut criu = rust_criu::Criu::new().map_err(|e| RestoreError::Criu(e.to_string()))?;
        criu.set_images_dir_fd(images.as_raw_fd());

        if let Some(rootfs) = &conf.rootfs {
            criu.set_root(rootfs.to_string_lossy().into_owned());
        }
        criu.set_log_file(CRIU_RESTORE_LOG_FILE.to_string());
        criu.set_log_level(4);
        criu.set_orphan_pts_master(true);
        criu.set_manage_cgroups(true);

        if let Err(e) = criu.restore() {
            return Err(RestoreError::Criu(format!(
                "restoring container {} failed with {:?}. Please check CRIU logfile {}/{}",
                name,
                e,
                statefile.display(),
                CRIU_RESTORE_LOG_FILE
            )));
        }
        tracing::debug!("container {} restored", name);

        self.after_restore(name, flags)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn fake_cgroup(root: &Path, name: &str) -> PathBuf {
        let cgroup = root.join(LXC_CGROUP_PARENT).join(name);
        fs::create_dir_all(&cgroup).unwrap();
        fs::write(cgroup.join("cgroup.freeze"), "0").unwrap();
        fs::write(cgroup.join("cgroup.events"), "populated 1\nfrozen 1\n").unwrap();
        cgroup
    }

    #[test]
    fn test_container_cgroup() {
        let engine = CriuEngine::new().with_cgroup_root("/tmp/cgroup");
        assert_eq!(
            engine.container_cgroup("web1"),
            PathBuf::from("/tmp/cgroup/lxc/web1")
        );
    }

    #[test]
    fn test_missing_state_file() {
        let tmp = tempfile::tempdir().unwrap();
        let statefile = tmp.path().join("web1.img");
        let conf = LxcConf::default();
        let err = CriuEngine::new()
            .restore("web1", &statefile, &conf, RestartFlags::empty())
            .unwrap_err();
        match err {
            RestoreError::StateFile { path, .. } => assert_eq!(path, statefile),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_after_restore_pause_freezes_cgroup() {
        let tmp = tempfile::tempdir().unwrap();
        let cgroup = fake_cgroup(tmp.path(), "web1");
        let engine = CriuEngine::new().with_cgroup_root(tmp.path());

        engine
            .after_restore("web1", RestartFlags::PAUSE)
            .expect("pause restored container");
        assert_eq!(fs::read_to_string(cgroup.join("cgroup.freeze")).unwrap(), "1");
    }

    #[test]
    fn test_after_restore_without_pause_leaves_cgroup() {
        let tmp = tempfile::tempdir().unwrap();
        let cgroup = fake_cgroup(tmp.path(), "web1");
        let engine = CriuEngine::new().with_cgroup_root(tmp.path());

        engine
            .after_restore("web1", RestartFlags::empty())
            .expect("release restored container");
        assert_eq!(fs::read_to_string(cgroup.join("cgroup.freeze")).unwrap(), "0");
    }

    #[test]
    fn test_after_restore_pause_without_cgroup() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = CriuEngine::new().with_cgroup_root(tmp.path());

        let err = engine
            .after_restore("web1", RestartFlags::PAUSE)
            .unwrap_err();
        assert!(matches!(err, RestoreError::Freeze(_)));
    }
}
