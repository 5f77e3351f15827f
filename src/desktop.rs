//! Desktop environments whose wallpaper lives in dconf

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Desktop {
    #[default]
    Cinnamon,
    Gnome,
    Mate,
}

impl Desktop {
    pub const ALL: [Desktop; 3] = [Desktop::Cinnamon, Desktop::Gnome, Desktop::Mate];

    pub fn name(&self) -> &'static str {
        match self {
            Desktop::Cinnamon => "cinnamon",
            Desktop::Gnome => "gnome",
            Desktop::Mate => "mate",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.name() == name)
    }

    /// dconf directory of the background schema
    pub fn schema_dir(&self) -> &'static str {
        match self {
            Desktop::Cinnamon => "/org/cinnamon/desktop/background",
            Desktop::Gnome => "/org/gnome/desktop/background",
            Desktop::Mate => "/org/mate/desktop/background",
        }
    }

    /// Keys that receive the image location
    pub fn image_keys(&self) -> &'static [&'static str] {
        match self {
            Desktop::Cinnamon => &["picture-uri"],
            // GNOME 42+ reads a separate key in dark mode
            Desktop::Gnome => &["picture-uri", "picture-uri-dark"],
            Desktop::Mate => &["picture-filename"],
        }
    }

    /// MATE stores a plain path, the others a file:// URI
    pub fn image_value(&self, path_expr: &str) -> String {
        match self {
            Desktop::Mate => path_expr.to_string(),
            _ => format!("file://{}", path_expr),
        }
    }

    /// Full dconf paths of every key the wallpaper setup controls
    pub fn controlled_keys(&self) -> Vec<String> {
        self.image_keys()
            .iter()
            .chain(std::iter::once(&"picture-options"))
            .map(|key| format!("{}/{}", self.schema_dir(), key))
            .collect()
    }

    /// `OnlyShowIn=` value for the autostart entry
    pub fn only_show_in(&self) -> &'static str {
        match self {
            Desktop::Cinnamon => "X-Cinnamon;",
            Desktop::Gnome => "GNOME;",
            Desktop::Mate => "MATE;",
        }
    }
}
