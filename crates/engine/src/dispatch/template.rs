use sentinel_common::device::split_list;
use sentinel_common::{Device, DeviceGroup, RuleConfig, Target};

use crate::verdict::ConditionResult;

/// Separates the subject from the body in alert and reset messages.
pub const INFO_MARKER: &str = "{info}";

/// Text before [`INFO_MARKER`] is the subject, text after it the body.
/// Without the marker the subject is empty and the whole text is the body.
pub fn split_message(text: &str) -> (&str, &str) {
    match text.find(INFO_MARKER) {
        Some(idx) => (&text[..idx], &text[idx + INFO_MARKER.len()..]),
        None => ("", text),
    }
}

pub struct TemplateVars<'a> {
    pub config: &'a RuleConfig,
    pub device: &'a Device,
    /// Only consulted for group-targeted rules.
    pub group: Option<&'a DeviceGroup>,
    pub result: &'a ConditionResult,
}

impl TemplateVars<'_> {
    fn target(&self) -> (&str, &str) {
        match self.config.target() {
            Target::Device(eui) => (eui, self.device.name.as_str()),
            Target::Group(eui) => (eui, self.group.map(|g| g.name.as_str()).unwrap_or_default()),
            Target::Tag { .. } | Target::Unset => ("", ""),
        }
    }

    pub fn render(&self, text: &str) -> String {
        let (target_eui, target_name) = self.target();
        let mut out = text
            .replace("{target.eui}", target_eui)
            .replace("{target.name}", target_name)
            .replace("{tag.name}", self.config.tag_name.as_deref().unwrap_or_default())
            .replace("{tag.value}", self.config.tag_value.as_deref().unwrap_or_default())
            .replace("{device.eui}", &self.device.eui)
            .replace("{device.name}", &self.device.name);
        if let Some(m) = &self.result.measurement {
            out = out.replace("{measurement}", m).replace("{var}", m);
        }
        if let Some(v) = self.result.value {
            out = out.replace("{value}", &format!("{v:?}"));
        }
        out
    }

    /// Rendered `(subject, body)`.
    pub fn render_message(&self, text: &str) -> (String, String) {
        let (subject, body) = split_message(text);
        (self.render(subject), self.render(body))
    }
}

/// Replaces `{device.team}`, `{device.admins}` and `{device.owner}` with the
/// device's own lists. Placeholders with nothing to substitute are left.
pub fn expand_team(list: &str, device: &Device) -> String {
    let mut out = list.to_string();
    for (token, value) in [
        ("{device.team}", device.team.trim()),
        ("{device.admins}", device.administrators.trim()),
        ("{device.owner}", device.user_id.trim()),
    ] {
        if !value.is_empty() {
            out = out.replace(token, value);
        }
    }
    out
}

/// Team then administrators, expanded, deduplicated in first-seen order,
/// without the rule owner.
pub fn recipients(config: &RuleConfig, device: &Device) -> Vec<String> {
    let team = expand_team(&config.team, device);
    let admins = expand_team(&config.administrators, device);
    let mut out: Vec<String> = Vec::new();
    for user in split_list(&team).into_iter().chain(split_list(&admins)) {
        if user == config.user_id || out.iter().any(|u| u == user) {
            continue;
        }
        out.push(user.to_string());
    }
    out
}
