use std::fs;
use std::path::{Path, PathBuf};

use super::{CgroupSetting, ConfigError, LxcConf, NetDev, NetworkType, Personality, Result};

const CGROUP_PREFIX: &str = "lxc.cgroup.";
const NETWORK_PREFIX: &str = "lxc.network.";

struct Line<'a> {
    path: &'a Path,
    number: usize,
    key: &'a str,
    value: &'a str,
}

impl<'a> Line<'a> {
    fn invalid(&self) -> ConfigError {
        ConfigError::InvalidValue {
            path: self.path.to_path_buf(),
            line: self.number,
            key: self.key.to_owned(),
            value: self.value.to_owned(),
        }
    }

    fn parse_error(&self, reason: impl Into<String>) -> ConfigError {
        ConfigError::Parse {
            path: self.path.to_path_buf(),
            line: self.number,
            reason: reason.into(),
        }
    }

    fn to_u32(&self) -> Result<u32> {
        self.value.parse().map_err(|_| self.invalid())
    }

    fn to_path(&self) -> PathBuf {
        PathBuf::from(self.value)
    }
}

/// Reads the configuration file at `path` into `conf`. On error `conf` is
/// left untouched.
pub fn read_file(path: &Path, conf: &mut LxcConf) -> Result<()> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut scratch = conf.clone();
    for (idx, raw) in content.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (key, value) = match trimmed.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => {
                return Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    reason: format!("invalid configuration line: {trimmed}"),
                })
            }
        };

        let line = Line {
            path,
            number: idx + 1,
            key,
            value,
        };
        parse_line(&line, &mut scratch)?;
    }

    tracing::debug!(?path, "configuration file read");
    *conf = scratch;
    Ok(())
}

fn parse_line(line: &Line, conf: &mut LxcConf) -> Result<()> {
    if line.key.starts_with(NETWORK_PREFIX) {
        return parse_network(line, conf);
    }

    if let Some(subsystem) = line.key.strip_prefix(CGROUP_PREFIX) {
        if subsystem.is_empty() {
            return Err(line.parse_error("missing cgroup subsystem"));
        }
        conf.cgroup.try_reserve(1)?;
        conf.cgroup.push(CgroupSetting {
            subsystem: subsystem.to_owned(),
            value: line.value.to_owned(),
        });
        return Ok(());
    }

    match line.key {
        "lxc.utsname" => {
            if line.value.is_empty() {
                return Err(line.invalid());
            }
            conf.utsname = Some(line.value.to_owned());
        }
        "lxc.arch" => {
            conf.personality = Some(match line.value {
                "x86" | "i686" => Personality::Linux32,
                "x86_64" | "amd64" => Personality::Linux64,
                _ => return Err(line.invalid()),
            });
        }
        "lxc.tty" => conf.tty = line.to_u32()?,
        "lxc.pts" => conf.pts = line.to_u32()?,
        "lxc.console" => conf.console = Some(line.to_path()),
        "lxc.rootfs" => conf.rootfs = Some(line.to_path()),
        "lxc.rootfs.mount" => conf.rootfs_mount = Some(line.to_path()),
        "lxc.pivotdir" => conf.pivotdir = Some(line.to_path()),
        "lxc.mount" => conf.fstab = Some(line.to_path()),
        "lxc.mount.entry" => {
            conf.mount_entries.try_reserve(1)?;
            conf.mount_entries.push(line.value.to_owned());
        }
        "lxc.cap.drop" => {
            for cap in line.value.split_whitespace() {
                conf.caps_drop.try_reserve(1)?;
                conf.caps_drop.push(cap.to_owned());
            }
        }
        _ => {
            return Err(ConfigError::UnknownKey {
                path: line.path.to_path_buf(),
                line: line.number,
                key: line.key.to_owned(),
            })
        }
    }

    Ok(())
}

fn parse_network(line: &Line, conf: &mut LxcConf) -> Result<()> {
    if line.key == "lxc.network.type" {
        let typ = match line.value {
            "veth" => NetworkType::Veth,
            "macvlan" => NetworkType::Macvlan,
            "vlan" => NetworkType::Vlan,
            "phys" => NetworkType::Phys,
            "empty" => NetworkType::Empty,
            _ => return Err(line.invalid()),
        };
        conf.networks.try_reserve(1)?;
        conf.networks.push(NetDev::new(typ));
        return Ok(());
    }

    // every other network key applies to the last declared device
    let netdev = match conf.networks.last_mut() {
        Some(netdev) => netdev,
        None => {
            return Err(line.parse_error(format!(
                "{} specified before lxc.network.type",
                line.key
            )))
        }
    };

    match line.key {
        "lxc.network.flags" => match line.value {
            "up" => netdev.up = true,
            _ => return Err(line.invalid()),
        },
        "lxc.network.link" => netdev.link = Some(line.value.to_owned()),
        "lxc.network.name" => netdev.name = Some(line.value.to_owned()),
        "lxc.network.hwaddr" => netdev.hwaddr = Some(line.value.to_owned()),
        "lxc.network.mtu" => {
            line.to_u32()?;
            netdev.mtu = Some(line.value.to_owned());
        }
        "lxc.network.ipv4" => {
            netdev.ipv4.try_reserve(1)?;
            netdev.ipv4.push(line.value.to_owned());
        }
        "lxc.network.ipv6" => {
            netdev.ipv6.try_reserve(1)?;
            netdev.ipv6.push(line.value.to_owned());
        }
        "lxc.network.script.up" => netdev.script_up = Some(line.to_path()),
        _ => {
            return Err(ConfigError::UnknownKey {
                path: line.path.to_path_buf(),
                line: line.number,
                key: line.key.to_owned(),
            })
        }
    }

    Ok(())
}
