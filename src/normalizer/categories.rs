/// Maps the sex codes used across publications onto one vocabulary.
/// Values outside the known codes are returned unchanged.
pub fn normalize_sex(sex: &str) -> &str {
    match sex {
        "V" => "Hombre",
        "M" => "Mujer",
        "Se desconoce" => "Desconocido",
        other => other,
    }
}

/// Parses a published age-range label into `start-end` (empty end for an
/// open upper bound).
///
/// Recognised forms: "Hasta N años", "De N a M años", "De N años o más" and
/// "Más de N años". Anything else, already-canonical text included, yields
/// `None`.
pub fn parse_age_range(raw: &str) -> Option<String> {
    let text = raw.trim().to_uppercase().replace('Á', "A");

    // "DE ... O MAS" has to be tried before the plain "DE ... A ..." form.
    let candidate = if text.starts_with("HASTA") {
        text.replace("HASTA ", "0-").replace(" AÑOS", "")
    } else if text.starts_with("DE") && text.ends_with("MAS") {
        text.replace("DE ", "")
            .replace(" AÑOS", "")
            .replace(" O MAS", "-")
    } else if text.starts_with("DE") {
        text.replace("DE ", "")
            .replace(" AÑOS", "")
            .replace(" A ", "-")
    } else if let Some(rest) = text.strip_prefix("MAS DE") {
        let lower = rest.replace(" AÑOS", "").trim().parse::<u32>().ok()?;
        format!("{}-", lower.checked_add(1)?)
    } else {
        return None;
    };

    is_canonical(&candidate).then_some(candidate)
}

fn is_canonical(range: &str) -> bool {
    range.split_once('-').is_some_and(|(start, end)| {
        !start.is_empty()
            && start.chars().all(|c| c.is_ascii_digit())
            && end.chars().all(|c| c.is_ascii_digit())
    })
}
