//! Setup form state, independent of how it is drawn

use crate::config::{
    ConfigError, SetupConfig, Share, Transport, DEFAULT_MOUNT_POINT, DEFAULT_SMB_VERSION,
};
use crate::desktop::Desktop;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldId {
    Server,
    Export,
    Share,
    Subdir,
    MountPoint,
    Username,
    Password,
    SmbVersion,
    Desktop,
    Lock,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Text rendered masked
    Secret,
    /// Cycles through fixed values
    Choice(&'static [&'static str]),
    Toggle,
}

const DESKTOP_CHOICES: &[&str] = &["cinnamon", "gnome", "mate"];

#[derive(Debug, Clone)]
pub struct Field {
    pub id: FieldId,
    pub label: &'static str,
    pub kind: FieldKind,
    pub value: String,
    pub checked: bool,
}

impl Field {
    fn text(id: FieldId, label: &'static str, value: &str) -> Self {
        Self {
            id,
            label,
            kind: FieldKind::Text,
            value: value.into(),
            checked: false,
        }
    }

    fn secret(id: FieldId, label: &'static str) -> Self {
        Self {
            kind: FieldKind::Secret,
            ..Self::text(id, label, "")
        }
    }

    fn choice(id: FieldId, label: &'static str, options: &'static [&'static str]) -> Self {
        Self {
            kind: FieldKind::Choice(options),
            ..Self::text(id, label, options[0])
        }
    }

    fn toggle(id: FieldId, label: &'static str, checked: bool) -> Self {
        Self {
            kind: FieldKind::Toggle,
            checked,
            ..Self::text(id, label, "")
        }
    }

    /// Text shown next to the label
    pub fn display_value(&self) -> String {
        match &self.kind {
            FieldKind::Text => self.value.clone(),
            FieldKind::Secret => "●".repeat(self.value.chars().count()),
            FieldKind::Choice(_) => format!("< {} >", self.value),
            FieldKind::Toggle => (if self.checked { "[x]" } else { "[ ]" }).to_string(),
        }
    }
}

/// What the front-end should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    None,
    Submit,
}

#[derive(Debug, Clone)]
pub struct Form {
    transport: Transport,
    fields: Vec<Field>,
    /// Index into `fields`; `fields.len()` is the Apply button
    focus: usize,
}

impl Form {
    pub fn new(transport: Transport) -> Self {
        let mut fields = match transport {
            Transport::Nfs => vec![
                Field::text(FieldId::Server, "Server IP", "192.168.122.40"),
                Field::text(FieldId::Export, "NFS export path", "/srv/share/wallpapers"),
                Field::text(FieldId::MountPoint, "Local mount point", DEFAULT_MOUNT_POINT),
            ],
            Transport::Cifs => vec![
                Field::text(FieldId::Server, "Windows server IP / name", "192.168.1.10"),
                Field::text(FieldId::Share, "Share name", "share"),
                Field::text(FieldId::Subdir, "Subfolder (e.g. wallpapers)", "wallpapers"),
                Field::text(FieldId::MountPoint, "Local mount point", DEFAULT_MOUNT_POINT),
                Field::text(FieldId::Username, "CIFS username", "wallpaper"),
                Field::secret(FieldId::Password, "CIFS password"),
                Field::text(FieldId::SmbVersion, "SMB version (vers=)", DEFAULT_SMB_VERSION),
            ],
        };
        fields.push(Field::choice(FieldId::Desktop, "Desktop", DESKTOP_CHOICES));
        fields.push(Field::toggle(
            FieldId::Lock,
            "Prevent users from changing the wallpaper (dconf lock)",
            true,
        ));

        Self {
            transport,
            fields,
            focus: 0,
        }
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn apply_focused(&self) -> bool {
        self.focus == self.fields.len()
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % (self.fields.len() + 1);
    }

    pub fn focus_prev(&mut self) {
        let slots = self.fields.len() + 1;
        self.focus = (self.focus + slots - 1) % slots;
    }

    fn focused_mut(&mut self) -> Option<&mut Field> {
        self.fields.get_mut(self.focus)
    }

    pub fn input(&mut self, c: char) {
        if let Some(field) = self.focused_mut() {
            match field.kind {
                FieldKind::Text | FieldKind::Secret => field.value.push(c),
                FieldKind::Toggle if c == ' ' => field.checked = !field.checked,
                _ => {}
            }
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.focused_mut() {
            if matches!(field.kind, FieldKind::Text | FieldKind::Secret) {
                field.value.pop();
            }
        }
    }

    /// Step a choice field forwards or backwards
    pub fn cycle(&mut self, forward: bool) {
        if let Some(field) = self.focused_mut() {
            if let FieldKind::Choice(options) = field.kind {
                let current = options.iter().position(|o| *o == field.value).unwrap_or(0);
                let next = if forward {
                    (current + 1) % options.len()
                } else {
                    (current + options.len() - 1) % options.len()
                };
                field.value = options[next].to_string();
            }
        }
    }

    /// Enter key: submit on Apply, flip toggles, otherwise move on
    pub fn activate(&mut self) -> FormAction {
        if self.apply_focused() {
            return FormAction::Submit;
        }
        match self.fields[self.focus].kind {
            FieldKind::Toggle => self.input(' '),
            FieldKind::Choice(_) => self.cycle(true),
            FieldKind::Text | FieldKind::Secret => self.focus_next(),
        }
        FormAction::None
    }

    pub fn value(&self, id: FieldId) -> &str {
        self.fields
            .iter()
            .find(|f| f.id == id)
            .map(|f| f.value.as_str())
            .unwrap_or("")
    }

    pub fn checked(&self, id: FieldId) -> bool {
        self.fields.iter().any(|f| f.id == id && f.checked)
    }

    pub fn set_value(&mut self, id: FieldId, value: &str) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.id == id) {
            field.value = value.to_string();
        }
    }

    /// Build a validated config from the current input
    pub fn to_config(&self) -> Result<SetupConfig, ConfigError> {
        let share = match self.transport {
            Transport::Nfs => Share::Nfs {
                server: self.value(FieldId::Server).into(),
                export: self.value(FieldId::Export).into(),
            },
            Transport::Cifs => Share::Cifs {
                server: self.value(FieldId::Server).into(),
                share: self.value(FieldId::Share).into(),
                subdir: self.value(FieldId::Subdir).into(),
                username: self.value(FieldId::Username).into(),
                password: self.value(FieldId::Password).into(),
                smb_version: self.value(FieldId::SmbVersion).into(),
            },
        };

        let mut config = SetupConfig::new(share);
        config.mount_point = self.value(FieldId::MountPoint).into();
        config.lock = self.checked(FieldId::Lock);
        config.desktop = Desktop::from_name(self.value(FieldId::Desktop)).unwrap_or_default();
        config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nfs_defaults_produce_valid_config() {
        let config = Form::new(Transport::Nfs).to_config().unwrap();
        assert_eq!(config.share.source(), "192.168.122.40:/srv/share/wallpapers");
        assert_eq!(config.mount_point, "/mnt/wallpaper");
        assert!(config.lock);
        assert_eq!(config.desktop, Desktop::Cinnamon);
    }

    #[test]
    fn cifs_requires_password() {
        let mut form = Form::new(Transport::Cifs);
        assert_eq!(
            form.to_config(),
            Err(ConfigError::MissingFields(vec!["password"]))
        );

        form.set_value(FieldId::Password, "pw");
        let config = form.to_config().unwrap();
        assert_eq!(config.share.source(), "//192.168.1.10/share/wallpapers");
    }

    #[test]
    fn focus_wraps_through_apply() {
        let mut form = Form::new(Transport::Nfs);
        let slots = form.fields().len() + 1;
        form.focus_prev();
        assert!(form.apply_focused());
        for _ in 0..slots {
            form.focus_next();
        }
        assert!(form.apply_focused());
        form.focus_next();
        assert_eq!(form.focus(), 0);
    }

    #[test]
    fn typing_edits_focused_text() {
        let mut form = Form::new(Transport::Nfs);
        form.backspace();
        form.input('1');
        assert_eq!(form.value(FieldId::Server), "192.168.122.41");
    }

    #[test]
    fn password_is_masked() {
        let mut form = Form::new(Transport::Cifs);
        form.set_value(FieldId::Password, "abc");
        let field = form
            .fields()
            .iter()
            .find(|f| f.id == FieldId::Password)
            .unwrap();
        assert_eq!(field.display_value(), "●●●");
    }

    #[test]
    fn toggle_and_choice_via_keys() {
        let mut form = Form::new(Transport::Nfs);
        let desktop = form
            .fields()
            .iter()
            .position(|f| f.id == FieldId::Desktop)
            .unwrap();
        for _ in 0..desktop {
            form.focus_next();
        }

        form.cycle(false);
        assert_eq!(form.value(FieldId::Desktop), "mate");
        assert_eq!(form.activate(), FormAction::None);
        assert_eq!(form.value(FieldId::Desktop), "cinnamon");

        form.focus_next();
        form.input('x');
        assert!(form.checked(FieldId::Lock));
        form.input(' ');
        assert!(!form.checked(FieldId::Lock));
        form.activate();
        assert!(form.checked(FieldId::Lock));

        form.focus_next();
        assert_eq!(form.activate(), FormAction::Submit);
    }

    #[test]
    fn desktop_choice_reaches_config() {
        let mut form = Form::new(Transport::Nfs);
        form.set_value(FieldId::Desktop, "gnome");
        assert_eq!(form.to_config().unwrap().desktop, Desktop::Gnome);
    }
}
