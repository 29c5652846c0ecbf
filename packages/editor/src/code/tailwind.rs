//! CSS declarations → Tailwind utility classes, and class-list merging.
//!
//! Style edits are written to source as `className` utilities rather than
//! inline styles. Each utility belongs to a *group* named after the CSS
//! property it sets; merging drops existing classes of the same group (and
//! variant prefix) so the newest value for a property wins.

/// Properties with a dedicated arbitrary-value prefix (`w-[10px]`).
const PREFIXES: &[(&str, &str)] = &[
    ("min-width", "min-w"),
    ("max-width", "max-w"),
    ("min-height", "min-h"),
    ("max-height", "max-h"),
    ("border-radius", "rounded"),
    ("opacity", "opacity"),
    ("gap", "gap"),
    ("top", "top"),
    ("right", "right"),
    ("bottom", "bottom"),
    ("left", "left"),
    ("z-index", "z"),
    ("padding-top", "pt"),
    ("padding-right", "pr"),
    ("padding-bottom", "pb"),
    ("padding-left", "pl"),
    ("margin-top", "mt"),
    ("margin-right", "mr"),
    ("margin-bottom", "mb"),
    ("margin-left", "ml"),
    ("padding", "p"),
    ("margin", "m"),
    ("width", "w"),
    ("height", "h"),
    ("background-color", "bg"),
    ("color", "text"),
    ("font-size", "text"),
];

/// Keyword values that map onto a named utility.
const KEYWORDS: &[(&str, &str, &str)] = &[
    ("display", "block", "block"),
    ("display", "inline-block", "inline-block"),
    ("display", "inline", "inline"),
    ("display", "flex", "flex"),
    ("display", "inline-flex", "inline-flex"),
    ("display", "grid", "grid"),
    ("display", "inline-grid", "inline-grid"),
    ("display", "contents", "contents"),
    ("display", "none", "hidden"),
    ("position", "static", "static"),
    ("position", "fixed", "fixed"),
    ("position", "absolute", "absolute"),
    ("position", "relative", "relative"),
    ("position", "sticky", "sticky"),
    ("font-weight", "100", "font-thin"),
    ("font-weight", "200", "font-extralight"),
    ("font-weight", "300", "font-light"),
    ("font-weight", "400", "font-normal"),
    ("font-weight", "normal", "font-normal"),
    ("font-weight", "500", "font-medium"),
    ("font-weight", "600", "font-semibold"),
    ("font-weight", "700", "font-bold"),
    ("font-weight", "bold", "font-bold"),
    ("font-weight", "800", "font-extrabold"),
    ("font-weight", "900", "font-black"),
    ("text-align", "left", "text-left"),
    ("text-align", "center", "text-center"),
    ("text-align", "right", "text-right"),
    ("text-align", "justify", "text-justify"),
];

const FONT_SIZES: &[&str] = &[
    "xs", "sm", "base", "lg", "xl", "2xl", "3xl", "4xl", "5xl", "6xl", "7xl", "8xl", "9xl",
];

/// Translate one CSS declaration into a utility class.
///
/// Returns `None` for an empty value, which callers treat as "remove the
/// property".
pub fn css_to_utility(property: &str, value: &str) -> Option<String> {
    let property = property.trim().to_ascii_lowercase();
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Some((_, _, class)) = KEYWORDS
        .iter()
        .find(|(p, v, _)| *p == property && v.eq_ignore_ascii_case(value))
    {
        return Some((*class).to_string());
    }

    let value = escape_arbitrary(value);
    // `text-[large]` would read as a color; the type hint keeps it a size.
    if property == "font-size" && !is_length(&value) {
        return Some(format!("text-[length:{value}]"));
    }
    match PREFIXES.iter().find(|(p, _)| *p == property) {
        Some((_, prefix)) => Some(format!("{prefix}-[{value}]")),
        None => Some(format!("[{property}:{value}]")),
    }
}

/// Tailwind arbitrary values cannot contain whitespace.
fn escape_arbitrary(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join("_")
}

/// CSS property a utility class sets, including its variant prefix
/// (`hover:bg-red-500` → `hover:background-color`).
///
/// Unknown classes form a group of their own.
pub fn class_group(class: &str) -> String {
    let (variants, base) = class.split_at(variant_end(class));
    format!("{variants}{}", base_group(base))
}

/// Byte offset just past the last variant colon. Colons inside brackets
/// belong to arbitrary values, not variants.
fn variant_end(class: &str) -> usize {
    let mut depth = 0usize;
    let mut end = 0;
    for (idx, c) in class.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => end = idx + 1,
            _ => {}
        }
    }
    end
}

fn base_group(class: &str) -> String {
    if let Some(inner) = class.strip_prefix('[').and_then(|c| c.strip_suffix(']')) {
        if let Some((property, _)) = inner.split_once(':') {
            return property.to_string();
        }
    }

    if let Some((property, _, _)) = KEYWORDS.iter().find(|(_, _, c)| *c == class) {
        return (*property).to_string();
    }

    let unsigned = class.strip_prefix('-').unwrap_or(class);

    if let Some(rest) = unsigned.strip_prefix("text-") {
        return if is_font_size(rest) {
            "font-size".to_string()
        } else {
            "color".to_string()
        };
    }

    let mut candidates: Vec<&(&str, &str)> = PREFIXES.iter().filter(|(_, prefix)| *prefix != "text").collect();
    candidates.sort_by_key(|(_, prefix)| std::cmp::Reverse(prefix.len()));
    for (property, prefix) in candidates {
        if unsigned
            .strip_prefix(*prefix)
            .is_some_and(|rest| rest.starts_with('-'))
        {
            return (*property).to_string();
        }
    }

    class.to_string()
}

fn is_font_size(rest: &str) -> bool {
    if let Some(value) = rest.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        if value.starts_with("length:") {
            return true;
        }
        if value.starts_with("color:") {
            return false;
        }
        return is_length(value);
    }
    FONT_SIZES.contains(&rest)
}

fn is_length(value: &str) -> bool {
    value.starts_with(|c: char| c.is_ascii_digit() || c == '.')
}

/// Merge `incoming` into `existing`; incoming classes replace existing ones
/// of the same group. Order of surviving classes is preserved.
pub fn merge_classes(existing: &str, incoming: &str) -> String {
    let incoming: Vec<&str> = incoming.split_whitespace().collect();
    let groups: Vec<String> = incoming.iter().map(|c| class_group(c)).collect();

    let mut merged: Vec<&str> = existing
        .split_whitespace()
        .filter(|class| !groups.contains(&class_group(class)))
        .collect();

    for class in incoming {
        if !merged.contains(&class) {
            merged.push(class);
        }
    }

    merged.join(" ")
}

/// Remove every class that sets `property` (without variants).
pub fn remove_property(existing: &str, property: &str) -> String {
    let property = property.trim().to_ascii_lowercase();
    existing
        .split_whitespace()
        .filter(|class| class_group(class) != property)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Apply one style change to a class list.
pub fn apply_style(existing: &str, property: &str, value: &str) -> String {
    match css_to_utility(property, value) {
        Some(class) => merge_classes(existing, &class),
        None => remove_property(existing, property),
    }
}

/// Apply a set of declarations in order.
pub fn apply_styles<'a>(existing: &str, styles: impl IntoIterator<Item = (&'a String, &'a String)>) -> String {
    styles
        .into_iter()
        .fold(existing.to_string(), |classes, (property, value)| {
            apply_style(&classes, property, value)
        })
}
