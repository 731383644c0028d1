//! Minecraft colour codes and display text.
//!
//! Prefixes are stored with `&` colour tokens (`&c[Scammer]`). The game
//! renders `§` codes, so prefixes are translated before display.

use chrono::NaiveDateTime;

/// Section sign introducing a formatting code.
pub const SECTION: char = '§';

/// Resets all colours and styles.
pub const RESET: &str = "§r";

const READABLE_DATE_TIME: &str = "%d.%m.%Y %H:%M:%S";

/// Replace `&` colour tokens with `§` codes.
pub fn translate_colors(text: &str) -> String {
    text.replace('&', "§")
}

/// Remove `§x` and `&x` formatting codes.
pub fn strip_colors(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == SECTION || c == '&' {
            // skip the code character too
            chars.next();
            continue;
        }
        out.push(c);
    }
    out
}

/// A prefix ready to be put in front of a name or chat line.
pub fn format_prefix(prefix: &str) -> String {
    format!("{} {RESET}", translate_colors(prefix))
}

/// Rebuild a display name for the current list membership.
///
/// Any of `stale_prefixes` that the name currently starts with is removed,
/// then `prefix` (if non-empty) is put in front.
pub fn decorate_name<'a>(
    display_name: &str,
    prefix: &str,
    stale_prefixes: impl IntoIterator<Item = &'a String>,
) -> String {
    let mut bare = display_name;
    for stale in stale_prefixes {
        if stale.is_empty() {
            continue;
        }
        if let Some(rest) = bare.strip_prefix(format_prefix(stale).as_str()) {
            bare = rest;
        }
    }

    if prefix.is_empty() {
        bare.to_string()
    } else {
        format!("{}{bare}", format_prefix(prefix))
    }
}

pub fn format_date_time(at: &NaiveDateTime) -> String {
    at.format(READABLE_DATE_TIME).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    #[test]
    fn translates_and_strips() {
        assert_eq!(translate_colors("&c[Scammer]&r"), "§c[Scammer]§r");
        assert_eq!(strip_colors("§c[Scammer]§r Bob"), "[Scammer] Bob");
        assert_eq!(strip_colors("&4&lWarn"), "Warn");
        assert_eq!(strip_colors("plain"), "plain");
    }

    #[test]
    fn prefix_ends_with_reset() {
        assert_eq!(format_prefix("&a[F]"), "§a[F] §r");
    }

    #[test]
    fn decorate_replaces_stale_prefix() {
        let stale: BTreeSet<String> = ["&c[S]".to_string(), "&a[T]".to_string()].into();
        let tagged = decorate_name("Bob", "&c[S]", &stale);
        assert_eq!(tagged, "§c[S] §rBob");

        let moved = decorate_name(&tagged, "&a[T]", &stale);
        assert_eq!(moved, "§a[T] §rBob");

        let removed = decorate_name(&moved, "", &stale);
        assert_eq!(removed, "Bob");
    }

    #[test]
    fn decorate_leaves_foreign_prefixes() {
        let stale: BTreeSet<String> = ["&c[S]".to_string()].into();
        assert_eq!(decorate_name("§6[VIP] Bob", "", &stale), "§6[VIP] Bob");
    }

    #[test]
    fn readable_dates() {
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(7, 3, 9)
            .unwrap();
        assert_eq!(format_date_time(&at), "01.05.2024 07:03:09");
    }
}
