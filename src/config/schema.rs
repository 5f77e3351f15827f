use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::desktop::Desktop;

/// Network filesystem used to reach the wallpaper share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Nfs,
    Cifs,
}

impl Transport {
    /// Parse from command line argument
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg.to_lowercase().as_str() {
            "nfs" => Some(Self::Nfs),
            "cifs" | "smb" | "windows" => Some(Self::Cifs),
            _ => None,
        }
    }

    /// `-t` argument for mount and `Type=` for the unit
    pub fn fs_type(&self) -> &'static str {
        match self {
            Transport::Nfs => "nfs",
            Transport::Cifs => "cifs",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Transport::Nfs => "NFS",
            Transport::Cifs => "Windows CIFS",
        }
    }
}

/// Connection parameters for the remote wallpaper folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "lowercase")]
pub enum Share {
    Nfs {
        #[serde(deserialize_with = "scalar_string")]
        server: String,
        /// Exported directory on the server (e.g. /srv/share/wallpapers)
        export: String,
    },
    Cifs {
        #[serde(deserialize_with = "scalar_string")]
        server: String,
        /// Share name as published by the SMB server
        #[serde(deserialize_with = "scalar_string")]
        share: String,
        /// Optional folder inside the share
        #[serde(default, deserialize_with = "scalar_string")]
        subdir: String,
        #[serde(deserialize_with = "scalar_string")]
        username: String,
        /// Left empty in files; prompted for at apply time
        #[serde(default, deserialize_with = "scalar_string")]
        password: String,
        #[serde(default = "default_smb_version", deserialize_with = "scalar_string")]
        smb_version: String,
    },
}

pub const DEFAULT_SMB_VERSION: &str = "3.0";

fn default_smb_version() -> String {
    DEFAULT_SMB_VERSION.into()
}

// Unquoted `1001`, `3.0` or `true` in YAML/TOML arrive as numbers or bools
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => format!("{:?}", f),
        Raw::Bool(b) => b.to_string(),
    })
}

impl Share {
    pub fn transport(&self) -> Transport {
        match self {
            Share::Nfs { .. } => Transport::Nfs,
            Share::Cifs { .. } => Transport::Cifs,
        }
    }

    pub fn fs_type(&self) -> &'static str {
        self.transport().fs_type()
    }

    /// `What=` value: `server:/export` or `//server/share[/subdir]`
    pub fn source(&self) -> String {
        match self {
            Share::Nfs { server, export } => format!("{}:{}", server, export),
            Share::Cifs {
                server,
                share,
                subdir,
                ..
            } => {
                if subdir.is_empty() {
                    format!("//{}/{}", server, share)
                } else {
                    format!("//{}/{}/{}", server, share, subdir)
                }
            }
        }
    }

    /// `Options=` value for the mount unit
    pub fn mount_options(&self) -> String {
        match self {
            Share::Nfs { .. } => "defaults".into(),
            Share::Cifs {
                username,
                password,
                smb_version,
                ..
            } => format!(
                "username={},password={},vers={},iocharset=utf8,ro",
                username,
                password.replace(',', ",,"),
                smb_version
            ),
        }
    }

    /// `-o` argument for the test mount, if any
    pub fn probe_options(&self) -> Option<String> {
        match self {
            Share::Nfs { .. } => None,
            Share::Cifs { .. } => Some(self.mount_options()),
        }
    }

    /// Whether the rendered unit carries secrets
    pub fn has_credentials(&self) -> bool {
        matches!(self, Share::Cifs { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupConfig {
    #[serde(flatten)]
    pub share: Share,

    #[serde(default = "default_mount_point")]
    pub mount_point: String,

    /// Lock the wallpaper keys so users cannot change them
    #[serde(default = "default_true")]
    pub lock: bool,

    #[serde(default)]
    pub desktop: Desktop,

    #[serde(default = "default_picture_options")]
    pub picture_options: String,
}

pub const DEFAULT_MOUNT_POINT: &str = "/mnt/wallpaper";

fn default_mount_point() -> String {
    DEFAULT_MOUNT_POINT.into()
}

fn default_picture_options() -> String {
    "scaled".into()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("required fields are empty: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("mount point must be an absolute path below /: {0}")]
    InvalidMountPoint(String),

    #[error("{0} must not contain line breaks")]
    ControlCharacter(&'static str),
}

impl SetupConfig {
    pub fn new(share: Share) -> Self {
        Self {
            share,
            mount_point: default_mount_point(),
            lock: true,
            desktop: Desktop::default(),
            picture_options: default_picture_options(),
        }
    }

    pub fn transport(&self) -> Transport {
        self.share.transport()
    }

    /// Normalize user input and reject values that cannot be provisioned.
    ///
    /// Text fields are trimmed, the CIFS subfolder loses surrounding slashes
    /// and an empty SMB version falls back to 3.0.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();

        match &mut self.share {
            Share::Nfs { server, export } => {
                clean("server", server, true, &mut missing)?;
                clean("export", export, true, &mut missing)?;
            }
            Share::Cifs {
                server,
                share,
                subdir,
                username,
                password,
                smb_version,
            } => {
                clean("server", server, true, &mut missing)?;
                clean("share", share, true, &mut missing)?;
                clean("subdir", subdir, false, &mut missing)?;
                *subdir = subdir.trim_matches('/').to_string();
                clean("username", username, true, &mut missing)?;
                clean("password", password, true, &mut missing)?;
                clean("smb_version", smb_version, false, &mut missing)?;
                if smb_version.is_empty() {
                    *smb_version = default_smb_version();
                }
            }
        }
        clean("mount_point", &mut self.mount_point, true, &mut missing)?;
        clean("picture_options", &mut self.picture_options, false, &mut missing)?;

        if !missing.is_empty() {
            return Err(ConfigError::MissingFields(missing));
        }

        if self.picture_options.is_empty() {
            self.picture_options = default_picture_options();
        }

        let trimmed = self.mount_point.trim_end_matches('/');
        if !Path::new(&self.mount_point).is_absolute() || trimmed.is_empty() {
            return Err(ConfigError::InvalidMountPoint(self.mount_point));
        }
        self.mount_point = trimmed.to_string();

        Ok(self)
    }
}

/// Trim `value` in place, noting it in `missing` when required and empty
fn clean(
    name: &'static str,
    value: &mut String,
    required: bool,
    missing: &mut Vec<&'static str>,
) -> Result<(), ConfigError> {
    *value = value.trim().to_string();
    if required && value.is_empty() {
        missing.push(name);
    }
    if value.contains(['\n', '\r']) {
        return Err(ConfigError::ControlCharacter(name));
    }
    Ok(())
}
