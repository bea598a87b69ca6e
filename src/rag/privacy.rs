//! Privacy transforms applied to every result path

/// Scramble an email address for display: keep the first four characters of
/// the local part, mask the rest with at least three asterisks, and preserve
/// the domain. Strings without an `@` come back fully masked.
pub fn scramble_email(email: &str) -> String {
    let Some((local, domain)) = email.split_once('@') else {
        return "***".to_string();
    };

    let local_len = local.chars().count();
    let visible: String = local.chars().take(4).collect();
    let mask_len = std::cmp::max(local_len.saturating_sub(4), 3);

    format!("{}{}@{}", visible, "*".repeat(mask_len), domain)
}
