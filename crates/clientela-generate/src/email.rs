use rand::Rng;

/// Build `given.surname<N>@domain`, with `N` uniform in 1..=9999.
pub fn derive_email<R: Rng + ?Sized>(
    given_name: &str,
    surname: &str,
    domain: &str,
    rng: &mut R,
) -> String {
    let local = local_part(given_name, surname);
    let suffix: u16 = rng.random_range(1..=9999);
    format!("{local}{suffix}@{domain}")
}

/// Lowercased `given.surname` with accented vowels and ñ folded to plain
/// letters and anything outside `[a-z0-9.]` removed.
pub fn local_part(given_name: &str, surname: &str) -> String {
    given_name
        .chars()
        .chain(std::iter::once('.'))
        .chain(surname.chars())
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || *ch == '.')
        .collect()
}

fn fold_accent(ch: char) -> char {
    match ch {
        'á' => 'a',
        'é' => 'e',
        'í' => 'i',
        'ó' => 'o',
        'ú' => 'u',
        'ñ' => 'n',
        other => other,
    }
}
