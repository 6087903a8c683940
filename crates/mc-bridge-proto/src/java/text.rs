//! Java text components flattened to Bedrock's legacy `§` formatting.

use mc_bridge_nbt::NbtTag;

const SECTION: char = '§';

fn color_code(name: &str) -> Option<char> {
    Some(match name {
        "black" => '0',
        "dark_blue" => '1',
        "dark_green" => '2',
        "dark_aqua" => '3',
        "dark_red" => '4',
        "dark_purple" => '5',
        "gold" => '6',
        "gray" => '7',
        "dark_gray" => '8',
        "blue" => '9',
        "green" => 'a',
        "aqua" => 'b',
        "red" => 'c',
        "light_purple" => 'd',
        "yellow" => 'e',
        "white" => 'f',
        _ => return None,
    })
}

const STYLE_CODES: &[(&str, char)] = &[
    ("obfuscated", 'k'),
    ("bold", 'l'),
    ("strikethrough", 'm'),
    ("underlined", 'n'),
    ("italic", 'o'),
];

/// Templates for the translation keys servers commonly send.
fn translation_template(key: &str) -> Option<&'static str> {
    Some(match key {
        "chat.type.text" => "<%s> %s",
        "chat.type.announcement" => "[%s] %s",
        "chat.type.emote" => "* %s %s",
        "chat.type.admin" => "[%s: %s]",
        "commands.message.display.incoming" => "%s whispers to you: %s",
        "multiplayer.player.joined" => "%s joined the game",
        "multiplayer.player.left" => "%s left the game",
        "multiplayer.disconnect.kicked" => "Kicked by an operator",
        "multiplayer.disconnect.server_shutdown" => "Server closed",
        "multiplayer.disconnect.not_whitelisted" => "You are not white-listed on this server!",
        "multiplayer.disconnect.server_full" => "The server is full!",
        "disconnect.timeout" => "Timed out",
        "death.attack.generic" => "%s died",
        _ => return None,
    })
}

/// Formatting inherited from parent components.
#[derive(Debug, Clone, Default)]
struct Style {
    color: Option<char>,
    flags: Vec<char>,
}

impl Style {
    fn child(&self, tag: &NbtTag) -> Self {
        let mut style = self.clone();
        if let Some(color) = tag.get("color").and_then(NbtTag::as_string).and_then(color_code) {
            style.color = Some(color);
        }
        for (key, code) in STYLE_CODES {
            match tag.get(key).and_then(NbtTag::as_bool) {
                Some(true) if !style.flags.contains(code) => style.flags.push(*code),
                Some(false) => style.flags.retain(|c| c != code),
                _ => {}
            }
        }
        style
    }

    fn prefix(&self) -> String {
        let mut out = String::new();
        if self.color.is_some() || !self.flags.is_empty() {
            out.push(SECTION);
            out.push('r');
        }
        if let Some(color) = self.color {
            out.push(SECTION);
            out.push(color);
        }
        for flag in &self.flags {
            out.push(SECTION);
            out.push(*flag);
        }
        out
    }
}

/// Renders a component tree as a single Bedrock string.
pub fn flatten(component: &NbtTag) -> String {
    let mut out = String::new();
    render(component, &Style::default(), &mut out);
    out
}

/// Same as [`flatten`] for the JSON form still used in the login state.
pub fn flatten_json(raw: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) => flatten(&json_to_tag(&value)),
        Err(_) => raw.to_owned(),
    }
}

fn json_to_tag(value: &serde_json::Value) -> NbtTag {
    match value {
        serde_json::Value::String(s) => NbtTag::String(s.clone()),
        serde_json::Value::Bool(b) => NbtTag::Byte(*b as i8),
        serde_json::Value::Number(n) => NbtTag::String(n.to_string()),
        serde_json::Value::Array(items) => NbtTag::List(items.iter().map(json_to_tag).collect()),
        serde_json::Value::Object(map) => NbtTag::Compound(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_tag(v)))
                .collect(),
        ),
        serde_json::Value::Null => NbtTag::String(String::new()),
    }
}

fn render(tag: &NbtTag, parent: &Style, out: &mut String) {
    match tag {
        NbtTag::String(text) => out.push_str(text),
        NbtTag::List(items) => {
            // the first element styles the rest
            let Some((first, rest)) = items.split_first() else {
                return;
            };
            let style = if matches!(first, NbtTag::Compound(_)) {
                parent.child(first)
            } else {
                parent.clone()
            };
            render(first, parent, out);
            for item in rest {
                render(item, &style, out);
            }
        }
        NbtTag::Compound(_) => render_compound(tag, parent, out),
        other => out.push_str(&other.to_string()),
    }
}

fn render_compound(tag: &NbtTag, parent: &Style, out: &mut String) {
    let style = parent.child(tag);
    let prefix = style.prefix();
    if let Some(text) = tag.get("text").and_then(NbtTag::as_string) {
        if !text.is_empty() {
            out.push_str(&prefix);
            out.push_str(text);
        }
    } else if let Some(text) = tag.get("").and_then(NbtTag::as_string) {
        out.push_str(&prefix);
        out.push_str(text);
    } else if let Some(key) = tag.get("translate").and_then(NbtTag::as_string) {
        let args: Vec<String> = tag
            .get("with")
            .and_then(NbtTag::as_list)
            .map(|items| {
                items
                    .iter()
                    .map(|item| {
                        let mut arg = String::new();
                        render(item, &style, &mut arg);
                        arg.push_str(&prefix);
                        arg
                    })
                    .collect()
            })
            .unwrap_or_default();
        let template = translation_template(key)
            .map(str::to_owned)
            .or_else(|| tag.get("fallback").and_then(NbtTag::as_string).map(str::to_owned));
        out.push_str(&prefix);
        match template {
            Some(template) => out.push_str(&substitute(&template, &args)),
            None => {
                out.push_str(key);
                if !args.is_empty() {
                    out.push(' ');
                    out.push_str(&args.join(" "));
                }
            }
        }
    } else if let Some(key) = tag.get("keybind").and_then(NbtTag::as_string) {
        out.push_str(&prefix);
        out.push_str(key);
    }

    if let Some(extra) = tag.get("extra").and_then(NbtTag::as_list) {
        for child in extra {
            render(child, &style, out);
        }
    }
}

/// Fills `%s` and `%1$s` placeholders; `%%` is a literal percent.
fn substitute(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut next = 0;
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some('s') => {
                chars.next();
                if let Some(arg) = args.get(next) {
                    out.push_str(arg);
                }
                next += 1;
            }
            Some(d) if d.is_ascii_digit() => {
                let mut index = 0usize;
                while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                    index = index * 10 + d as usize;
                    chars.next();
                }
                if chars.next() == Some('$') && chars.next() == Some('s') {
                    if let Some(arg) = index.checked_sub(1).and_then(|i| args.get(i)) {
                        out.push_str(arg);
                    }
                }
            }
            _ => out.push('%'),
        }
    }
    out
}
