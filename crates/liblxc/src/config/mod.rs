//! Container configuration
//! The configuration object is created empty and optionally populated from
//! an LXC style configuration file (`lxc.key = value` lines).
use std::collections::TryReserveError;
use std::path::{Path, PathBuf};

use serde::Serialize;

mod parse;

pub use parse::read_file;

/// Name of the configuration file inside a container directory
pub const CONFIG_FILE_NAME: &str = "config";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path:?}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("{path:?}:{line}: unknown key {key}")]
    UnknownKey {
        path: PathBuf,
        line: usize,
        key: String,
    },
    #[error("{path:?}:{line}: invalid value {value:?} for {key}")]
    InvalidValue {
        path: PathBuf,
        line: usize,
        key: String,
        value: String,
    },
    #[error("failed to allocate configuration")]
    Alloc(#[from] TryReserveError),
}

type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    Linux32,
    Linux64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Veth,
    Macvlan,
    Vlan,
    Phys,
    Empty,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NetDev {
    pub typ: NetworkType,
    pub up: bool,
    pub link: Option<String>,
    pub name: Option<String>,
    pub hwaddr: Option<String>,
    pub mtu: Option<String>,
    pub ipv4: Vec<String>,
    pub ipv6: Vec<String>,
    pub script_up: Option<PathBuf>,
}

impl NetDev {
    pub fn new(typ: NetworkType) -> Self {
        Self {
            typ,
            up: false,
            link: None,
            name: None,
            hwaddr: None,
            mtu: None,
            ipv4: Vec::new(),
            ipv6: Vec::new(),
            script_up: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CgroupSetting {
    pub subsystem: String,
    pub value: String,
}

/// In-memory representation of a container configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LxcConf {
    pub utsname: Option<String>,
    pub personality: Option<Personality>,
    pub tty: u32,
    pub pts: u32,
    pub console: Option<PathBuf>,
    pub rootfs: Option<PathBuf>,
    pub rootfs_mount: Option<PathBuf>,
    pub pivotdir: Option<PathBuf>,
    pub fstab: Option<PathBuf>,
    pub mount_entries: Vec<String>,
    pub cgroup: Vec<CgroupSetting>,
    pub networks: Vec<NetDev>,
    pub caps_drop: Vec<String>,
}

impl LxcConf {
    /// Creates an empty configuration. The lists are pre-sized with
    /// fallible allocation so that an allocation failure is reported
    /// rather than aborting the process.
    pub fn init() -> Result<Self> {
        let mut conf = LxcConf::default();
        conf.mount_entries.try_reserve(4)?;
        conf.cgroup.try_reserve(4)?;
        conf.networks.try_reserve(1)?;
        conf.caps_drop.try_reserve(4)?;
        Ok(conf)
    }

    pub fn is_empty(&self) -> bool {
        *self == LxcConf::default()
    }
}

/// Creates and populates configuration objects
pub trait ConfigLoader {
    /// Allocates a new empty configuration
    fn init_config(&self) -> Result<LxcConf>;
    /// Populates `conf` from the file at `path`
    fn load_config(&self, path: &Path, conf: &mut LxcConf) -> Result<()>;
}

/// Loader reading LXC configuration files from disk
#[derive(Debug, Default, Clone, Copy)]
pub struct FileConfigLoader;

impl ConfigLoader for FileConfigLoader {
    fn init_config(&self) -> Result<LxcConf> {
        LxcConf::init()
    }

    fn load_config(&self, path: &Path, conf: &mut LxcConf) -> Result<()> {
        read_file(path, conf)
    }
}
